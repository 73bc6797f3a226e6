//! Tracker listener over a real loopback socket

use std::sync::Arc;
use std::time::Duration;

use h02own_core::testing::RecordingBus;
use h02own_core::{DeviceConfig, DeviceTable, Gateway, GatewayOptions, IgnitionBit};
use h02ownd::config::GatewayConfig;
use h02ownd::listener;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

const CONFIG: &str = r#"
host: 127.0.0.1
port: 5013
ignition_bit: bit5
mqtt:
  topic: tracks
devices:
  - h02: { id: 1234567890 }
    owntracks: { tid: T1, name: alice, device: phone }
"#;

async fn wait_for_messages(bus: &RecordingBus, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while bus.messages().len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("messages published in time");
}

async fn start(gateway: Gateway) -> (std::net::SocketAddr, CancellationToken, tokio::task::JoinHandle<()>) {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(listener::serve(tcp, gateway, shutdown.clone()));
    (addr, shutdown, server)
}

#[tokio::test]
async fn test_frames_from_socket_are_published() {
    let config = GatewayConfig::from_yaml(CONFIG).unwrap();
    let bus = Arc::new(RecordingBus::new());
    let gateway = Gateway::new(
        Arc::new(config.device_table()),
        bus.clone(),
        config.gateway_options(),
    );
    let (addr, shutdown, server) = start(gateway).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    // ignition on with bit5, split mid-frame, one malformed frame in between
    stream
        .write_all(b"*HQ,1234567890,V1,123456,A,2234.1234,N,11334.")
        .await
        .unwrap();
    stream
        .write_all(b"4321,E,12.3,45,010124,FFFF20FF#*HQ,garbage#")
        .await
        .unwrap();
    stream
        .write_all(b"*HQ,1234567890,V1,123500,V,2234.1234,N,11334.4321,E,0.0,0,010124,00000000#")
        .await
        .unwrap();

    wait_for_messages(&bus, 2).await;

    let messages = bus.messages();
    assert!(messages.iter().all(|m| m.topic == "tracks/alice/phone"));
    assert!(messages.iter().all(|m| m.retain));

    let first: Value = serde_json::from_slice(&messages[0].payload).unwrap();
    assert_eq!(first["_type"], "location");
    assert_eq!(first["tid"], "T1");
    assert_eq!(first["tst"], 1704112496);
    assert_eq!(first["acc"], 0);
    assert_eq!(first["t"], "i");

    let second: Value = serde_json::from_slice(&messages[1].payload).unwrap();
    assert_eq!(second["acc"], 1000);
    assert_eq!(second["t"], "I");

    drop(stream);
    shutdown.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn test_connections_are_independent() {
    let devices = DeviceTable::new(vec![
        DeviceConfig::new(1, "A", "alice", "car"),
        DeviceConfig::new(2, "B", "bob", "bike"),
    ]);
    let bus = Arc::new(RecordingBus::new());
    let options = GatewayOptions {
        ignition_bit: IgnitionBit::Legacy,
        ..GatewayOptions::default()
    };
    let gateway = Gateway::new(Arc::new(devices), bus.clone(), options);
    let (addr, shutdown, server) = start(gateway).await;

    let mut first = TcpStream::connect(addr).await.unwrap();
    let mut second = TcpStream::connect(addr).await.unwrap();

    // oversized garbage closes only the first connection
    let _ = first.write_all(&vec![b'x'; 2048]).await;
    second
        .write_all(b"*HQ,2,V1,101010,A,5000.0000,N,01000.0000,E,1.0,90,020324,FFFFFFFF#")
        .await
        .unwrap();

    wait_for_messages(&bus, 1).await;
    let messages = bus.messages();
    assert_eq!(messages[0].topic, "owntracks/bob/bike");

    let record: Value = serde_json::from_slice(&messages[0].payload).unwrap();
    assert_eq!(record["t"], "I");

    shutdown.cancel();
    server.await.unwrap();
}
