// Copyright 2025 NeuroBlue Contributors
// SPDX-License-Identifier: Apache-2.0

//! Full session over a real loopback TCP peer

mod common;

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use std::time::Duration;

use common::FakeEngine;
use neuroblue_config::ServiceConfig;
use neuroblue_session::{serve, EndReason, ServiceRecord, SessionOptions, TcpBootstrap};

fn read_one(stream: &mut TcpStream) -> u8 {
    let mut buf = [0u8; 1];
    stream.read_exact(&mut buf).expect("peer read failed");
    buf[0]
}

#[test]
fn train_detect_stop_over_tcp() {
    let mut bootstrap =
        TcpBootstrap::bind("127.0.0.1:0", ServiceRecord::from(&ServiceConfig::default())).unwrap();
    let addr = bootstrap.local_addr();

    let server = thread::spawn(move || {
        let options = SessionOptions {
            honor_stop: true,
            poll_min: Duration::from_millis(1),
            poll_max: Duration::from_millis(5),
        };
        serve(&mut bootstrap, FakeEngine::with_detections(&[0x04]), options)
    });

    let mut peer = TcpStream::connect(addr).unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    peer.write_all(&[0x31, 0x09]).unwrap();
    assert_eq!(read_one(&mut peer), 0x32);

    peer.write_all(&[0x33]).unwrap();
    assert_eq!(read_one(&mut peer), 0x04);

    peer.write_all(&[0x34]).unwrap();
    peer.shutdown(Shutdown::Both).unwrap();

    let summary = server.join().unwrap().unwrap();
    assert_eq!(summary.trainings, 1);
    assert_eq!(summary.detections_sent, 1);
    assert_eq!(summary.labels_rejected, 0);
    assert_eq!(summary.end_reason, EndReason::ClosedWhileReading);
}

#[test]
fn peer_disconnect_during_detection_ends_session() {
    let mut bootstrap =
        TcpBootstrap::bind("127.0.0.1:0", ServiceRecord::from(&ServiceConfig::default())).unwrap();
    let addr = bootstrap.local_addr();

    let server = thread::spawn(move || {
        serve(&mut bootstrap, FakeEngine::default(), SessionOptions::default())
    });

    let mut peer = TcpStream::connect(addr).unwrap();
    peer.write_all(&[0x33]).unwrap();
    thread::sleep(Duration::from_millis(20));
    drop(peer);

    let summary = server.join().unwrap().unwrap();
    assert_eq!(summary.end_reason, EndReason::ClosedWhileReading);
    assert_eq!(summary.detections_sent, 0);
}
