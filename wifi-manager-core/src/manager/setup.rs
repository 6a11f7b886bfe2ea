//! 启动和清理逻辑

use super::{ManagerState, ResourceOwnership, WifiManager};
use crate::traits::RadioEventHandler;
use crate::types::{DriverCode, PowerSave, WifiMode};
use crate::{Error, Resource, Result};
use std::sync::Arc;

impl WifiManager {
    /// Brings up storage, the network stack and the radio in station mode.
    ///
    /// Calling this while already initialized (or while another `init` is
    /// running) is a no-op success. On failure the manager is back in
    /// `Uninitialized` and the radio, if it was brought up, is released.
    pub async fn init(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle();
            match lifecycle.state {
                ManagerState::Uninitialized => lifecycle.state = ManagerState::Initializing,
                ManagerState::Initializing | ManagerState::Ready => {
                    tracing::info!("Wi-Fi already initialized");
                    return Ok(());
                }
                state => return Err(Error::Busy { op: "init", state }),
            }
        }
        tracing::info!("Initializing Wi-Fi...");

        let mut radio_up = false;
        match self.bring_up(&mut radio_up).await {
            Ok(()) => {
                self.set_state(ManagerState::Ready);
                tracing::info!(owned = ?self.owned_resources(), "Wi-Fi initialized");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Wi-Fi initialization failed");
                if radio_up {
                    self.release_radio_after_failed_init().await;
                }
                self.set_state(ManagerState::Uninitialized);
                Err(e)
            }
        }
    }

    /// Stops the radio and destroys the resources this manager created.
    ///
    /// A no-op success when not initialized. Failures are reported without
    /// rolling back what was already torn down.
    pub async fn deinit(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle();
            match lifecycle.state {
                ManagerState::Uninitialized => {
                    tracing::info!("Wi-Fi is not initialized");
                    return Ok(());
                }
                ManagerState::Ready => lifecycle.state = ManagerState::Deinitializing,
                state => return Err(Error::Busy { op: "deinit", state }),
            }
        }
        tracing::info!("Deinitializing Wi-Fi...");

        if let Err(e) = self.stop_radio().await {
            tracing::error!(error = %e, "Failed to stop the radio");
            self.set_state(ManagerState::Ready);
            return Err(e);
        }
        self.bridge.reset_link();
        self.bridge.reset_scan();

        // The radio is gone; the lifecycle ends here even if a resource
        // teardown fails. Anything left is still recorded as owned.
        let result = self.release_resources().await;
        self.set_state(ManagerState::Uninitialized);
        match &result {
            Ok(()) => tracing::info!("Wi-Fi deinitialized"),
            Err(e) => tracing::error!(error = %e, "Wi-Fi teardown incomplete"),
        }
        result
    }

    async fn bring_up(&self, radio_up: &mut bool) -> Result<()> {
        self.init_storage().await?;

        self.system
            .netif_init()
            .await
            .map_err(|code| Error::driver("netif_init", code))?;

        self.ensure_event_loop().await?;
        self.ensure_station_netif().await?;

        self.radio
            .init()
            .await
            .map_err(|code| Error::driver("radio_init", code))?;
        *radio_up = true;

        self.radio
            .set_power_save(PowerSave::None)
            .await
            .map_err(|code| Error::driver("set_power_save", code))?;

        let handler: Arc<dyn RadioEventHandler> = self.bridge.clone();
        self.radio
            .subscribe(handler)
            .await
            .map_err(|code| Error::driver("subscribe", code))?;

        self.radio
            .set_mode(WifiMode::Station)
            .await
            .map_err(|code| Error::driver("set_mode", code))?;
        self.radio
            .start()
            .await
            .map_err(|code| Error::driver("start", code))?;

        if let Some(country) = &self.config.country {
            tracing::info!(code = %country.code, "Setting Wi-Fi country");
            self.radio
                .set_country(country)
                .await
                .map_err(|code| Error::driver("set_country", code))?;
        }
        Ok(())
    }

    /// Mounts storage, erasing and retrying once when it reports it is full
    /// or was written by a newer format.
    async fn init_storage(&self) -> Result<()> {
        match self.system.storage_init().await {
            Ok(()) => Ok(()),
            Err(code) if code.needs_storage_erase() => {
                tracing::warn!(%code, "Storage needs erasing, retrying once");
                self.system
                    .storage_erase()
                    .await
                    .map_err(|code| Error::StorageRecoveryFailed { code })?;
                self.system
                    .storage_init()
                    .await
                    .map_err(|code| Error::StorageRecoveryFailed { code })
            }
            Err(code) => Err(Error::driver("storage_init", code)),
        }
    }

    async fn ensure_event_loop(&self) -> Result<()> {
        if self.lifecycle().owned.event_loop.is_owned() {
            return Ok(());
        }
        let ownership = match self.system.event_loop_create_default().await {
            Ok(()) => ResourceOwnership::Created,
            Err(DriverCode::INVALID_STATE) => {
                tracing::warn!("Default event loop already created elsewhere");
                ResourceOwnership::PreExisting
            }
            Err(code) => {
                return Err(Error::ResourceCreationFailed {
                    resource: Resource::EventLoop,
                    code,
                });
            }
        };
        self.lifecycle().owned.event_loop = ownership;
        Ok(())
    }

    async fn ensure_station_netif(&self) -> Result<()> {
        if self.lifecycle().owned.owned_netif().is_some() {
            return Ok(());
        }
        match self.system.create_station_netif().await {
            Ok(handle) => {
                let mut lifecycle = self.lifecycle();
                lifecycle.owned.station_netif = ResourceOwnership::Created;
                lifecycle.owned.netif_handle = Some(handle);
                Ok(())
            }
            Err(DriverCode::INVALID_STATE) => {
                tracing::warn!("Station interface already created elsewhere");
                self.lifecycle().owned.station_netif = ResourceOwnership::PreExisting;
                Ok(())
            }
            Err(code) => Err(Error::ResourceCreationFailed {
                resource: Resource::StationNetif,
                code,
            }),
        }
    }

    async fn stop_radio(&self) -> Result<()> {
        self.radio
            .stop()
            .await
            .map_err(|code| Error::driver("stop", code))?;
        self.radio
            .deinit()
            .await
            .map_err(|code| Error::driver("radio_deinit", code))
    }

    async fn release_resources(&self) -> Result<()> {
        let netif = self.lifecycle().owned.owned_netif();
        if let Some(handle) = netif {
            self.system
                .destroy_netif(handle)
                .await
                .map_err(|code| Error::driver("destroy_netif", code))?;
            let mut lifecycle = self.lifecycle();
            lifecycle.owned.station_netif = ResourceOwnership::NotCreated;
            lifecycle.owned.netif_handle = None;
        }

        if self.lifecycle().owned.event_loop.is_owned() {
            self.system
                .event_loop_delete_default()
                .await
                .map_err(|code| Error::driver("event_loop_delete", code))?;
        }

        // Pre-existing resources were never ours; forget them too.
        let mut lifecycle = self.lifecycle();
        lifecycle.owned.event_loop = ResourceOwnership::NotCreated;
        lifecycle.owned.station_netif = ResourceOwnership::NotCreated;
        Ok(())
    }

    async fn release_radio_after_failed_init(&self) {
        if let Err(code) = self.radio.stop().await {
            tracing::debug!(%code, "Radio stop during init rollback");
        }
        if let Err(code) = self.radio.deinit().await {
            tracing::warn!(%code, "Radio deinit during init rollback failed");
        }
    }
}
