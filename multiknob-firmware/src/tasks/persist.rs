//! Active-profile persistence task
//!
//! Owns the flash storage after boot and writes back profile changes
//! requested by the control loop. Failures are logged and dropped.

use defmt::*;

use crate::channels::PERSIST_REQUEST;
use crate::config::ConfigPersistence;

#[embassy_executor::task]
pub async fn persist_task(mut persistence: ConfigPersistence<'static>) {
    info!("Persist task started");

    loop {
        let index = PERSIST_REQUEST.wait().await;

        match persistence.save_active_profile(index).await {
            Ok(()) => {
                info!("Active profile {} saved", index);
            }
            Err(e) => {
                error!("Failed to save active profile {}: {:?}", index, e);
            }
        }
    }
}
