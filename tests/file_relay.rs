//! Integration tests for opaque file relay.

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::TestServer;
use relay_proto::ServerLine;
use std::time::Duration;

#[tokio::test]
async fn test_file_round_trips_byte_for_byte() {
    let server = TestServer::spawn(17131).await.expect("spawn server");
    let mut dave = server.connect("dave").await.unwrap();
    let mut erin = server.connect("erin").await.unwrap();
    dave.drain().await;

    let original: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    let payload = STANDARD.encode(&original);
    dave.send_line(&format!("FILE::report.bin::{payload}"))
        .await
        .unwrap();

    let expected = format!("FILE_FROM::dave::report.bin::{payload}");
    dave.expect_line(&expected).await.unwrap();

    let line = erin.recv_parsed().await.unwrap();
    let (filename, relayed) = line.file_parts().expect("file line");
    assert_eq!(filename, "report.bin");
    assert_eq!(STANDARD.decode(relayed).unwrap(), original);
}

#[tokio::test]
async fn test_large_file_is_relayed() {
    let server = TestServer::spawn(17132).await.expect("spawn server");
    let mut dave = server.connect("dave").await.unwrap();
    let mut erin = server.connect("erin").await.unwrap();
    dave.drain().await;

    let original = vec![0xA5u8; 1024 * 1024];
    let payload = STANDARD.encode(&original);
    dave.send_line(&format!("FILE::big.img::{payload}"))
        .await
        .unwrap();

    let line = erin.recv_parsed().await.unwrap();
    assert!(matches!(&line, ServerLine::FileFrom { from, .. } if from == "dave"));
    let (_, relayed) = line.file_parts().unwrap();
    assert_eq!(STANDARD.decode(relayed).unwrap(), original);
}

#[tokio::test]
async fn test_file_body_is_not_inspected() {
    let server = TestServer::spawn(17133).await.expect("spawn server");
    let mut dave = server.connect("dave").await.unwrap();

    dave.send_line("FILE::no-delimiter").await.unwrap();
    dave.expect_line("FILE_FROM::dave::no-delimiter").await.unwrap();

    dave.send_line("FILE::a.txt::not base64 at all::!").await.unwrap();
    dave.expect_line("FILE_FROM::dave::a.txt::not base64 at all::!")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_oversized_line_closes_only_the_sender() {
    let config = "[limits]\nmax_line_length = 1024\n";
    let server = TestServer::spawn_with_config(17134, config)
        .await
        .expect("spawn server");
    let mut dave = server.connect("dave").await.unwrap();
    let mut erin = server.connect("erin").await.unwrap();
    dave.drain().await;

    let huge = format!("FILE::x.bin::{}", "A".repeat(4096));
    dave.send_line(&huge).await.unwrap();
    dave.expect_closed(Duration::from_secs(5)).await.unwrap();

    erin.expect_line("USER_EVENT::left::dave").await.unwrap();
    erin.expect_line("Online users: erin|Online").await.unwrap();
}
