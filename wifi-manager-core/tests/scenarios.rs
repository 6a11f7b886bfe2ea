//! End-to-end flows through the public API, driven by the simulated radio.

use std::sync::Arc;
use wifi_manager_core::backends::mock::{Call, SimulatedRadio, access_point, demo_networks};
use wifi_manager_core::types::{AuthMode, ConnectionRequest, RadioEvent, auth_mode_label};
use wifi_manager_core::{Error, ManagerConfig, ManagerState, ResourceOwnership, WifiManager};

fn setup(radio: &SimulatedRadio) -> WifiManager {
    WifiManager::with_driver(ManagerConfig::default(), Arc::new(radio.clone())).unwrap()
}

#[tokio::test]
async fn scan_three_networks_and_label_them() {
    let radio = SimulatedRadio::new().with_networks(vec![
        access_point("Net1", -42, 1, AuthMode::Open),
        access_point("Net2", -58, 6, AuthMode::Wpa2Psk),
        access_point("Net3", -67, 11, AuthMode::Wpa3Psk),
    ]);
    let manager = setup(&radio);

    manager.init().await.unwrap();
    let result = manager.scan().await.unwrap();

    assert_eq!(manager.ap_count(), 3);
    let ssids: Vec<_> = result.iter().map(|ap| ap.ssid.to_string()).collect();
    assert_eq!(ssids, ["Net1", "Net2", "Net3"]);
    let modes: Vec<_> = result.iter().map(|ap| ap.auth_mode).collect();
    assert_eq!(modes, [AuthMode::Open, AuthMode::Wpa2Psk, AuthMode::Wpa3Psk]);
    assert_eq!(auth_mode_label(AuthMode::Wpa2Psk), "WPA2_PSK");
    assert!(result.records()[0].cipher.is_none());
}

#[tokio::test]
async fn second_init_changes_nothing() {
    let radio = SimulatedRadio::new();
    let manager = setup(&radio);

    manager.init().await.unwrap();
    let owned = manager.owned_resources();
    manager.init().await.unwrap();

    assert_eq!(manager.owned_resources(), owned);
    assert_eq!(radio.calls(Call::RadioInit), 1);
    assert_eq!(radio.calls(Call::Start), 1);
}

#[tokio::test]
async fn connect_before_init_is_refused() {
    let radio = SimulatedRadio::new();
    let manager = setup(&radio);

    let err = manager
        .connect(&ConnectionRequest::new("Home", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
    assert_eq!(radio.calls(Call::SetStationConfig), 0);
    assert_eq!(radio.calls(Call::Connect), 0);
}

#[tokio::test]
async fn borrowed_event_loop_is_left_alone() {
    let radio = SimulatedRadio::new().with_preexisting_event_loop();
    let manager = setup(&radio);

    manager.init().await.unwrap();
    assert_eq!(
        manager.owned_resources().event_loop,
        ResourceOwnership::PreExisting
    );
    manager.deinit().await.unwrap();

    assert_eq!(radio.calls(Call::EventLoopDelete), 0);
    assert!(radio.event_loop_exists());
}

#[tokio::test]
async fn full_settings_screen_cycle() {
    let radio = SimulatedRadio::new().with_networks(demo_networks());
    let manager = setup(&radio);

    // Switch on: init, then scan.
    manager.init().await.unwrap();
    let list = manager.scan().await.unwrap();
    assert_eq!(list.len(), demo_networks().len());
    assert!(list.iter().any(|ap| ap.ssid.is_hidden()));

    // Pick a network.
    manager.connect_to("MyHomeWiFi", "correct horse").await.unwrap();
    assert_eq!(
        radio.station_config().unwrap().ssid.as_str(),
        "MyHomeWiFi"
    );

    // Unrelated driver events are ignored.
    radio.emit(RadioEvent::Other(42));
    assert_eq!(manager.state(), ManagerState::Ready);

    // Switch off, then on again.
    manager.deinit().await.unwrap();
    assert_eq!(manager.state(), ManagerState::Uninitialized);
    manager.deinit().await.unwrap();
    manager.init().await.unwrap();
    assert_eq!(radio.calls(Call::RadioInit), 2);
    assert_eq!(radio.subscriber_count(), 1);
}
