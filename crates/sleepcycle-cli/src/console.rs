//! Terminal stand-ins for the device alarm and toast surfaces.

use async_trait::async_trait;
use sleepcycle_core::{AlarmError, AlarmPlatform, AlarmRequest, Notifier, Toast};

/// Prints the alarm it would register.
pub struct ConsoleAlarm;

#[async_trait]
impl AlarmPlatform for ConsoleAlarm {
    async fn schedule(&self, request: &AlarmRequest) -> Result<(), AlarmError> {
        println!(
            "alarm {:02}:{:02} \"{}\"",
            request.hour, request.minute, request.message
        );
        Ok(())
    }
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: &Toast) {
        println!("{}: {}", toast.title, toast.body);
    }
}
