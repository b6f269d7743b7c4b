//! End-to-end motion state machine tests over a scripted serial bridge.
//!
//! The bridge releases one scripted reply into the receive buffer per
//! command write, which models a device that answers each request while
//! still letting unsolicited terminal frames interleave with status polls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aptlink::motion::{MotionConfig, MotionController, MotionError};
use aptlink::transport::{
    DataBits, DeviceDirectory, DeviceSession, FlowControl, Parity, PortInfo, PurgeDirection,
    SerialBridge, SerialPort, StopBits, TransportError,
};
use aptlink::{ConnectError, WriteError};

const STATUS_REQUEST_IDS: [[u8; 2]; 2] = [[0x80, 0x04], [0x90, 0x04]];

#[derive(Default)]
struct LinkState {
    rx: Vec<u8>,
    writes: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    status_polls: usize,
    write_cap: Option<usize>,
}

#[derive(Clone, Default)]
struct ScriptedLink(Arc<Mutex<LinkState>>);

impl ScriptedLink {
    fn script(&self, reply: Vec<u8>) {
        self.0.lock().unwrap().replies.push_back(reply);
    }

    fn status_polls(&self) -> usize {
        self.0.lock().unwrap().status_polls
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().writes.clone()
    }
}

struct ScriptedPort(ScriptedLink);

impl SerialPort for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.0.0.lock().unwrap();
        let n = buf.len().min(state.rx.len());
        let taken: Vec<u8> = state.rx.drain(..n).collect();
        buf[..n].copy_from_slice(&taken);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.0.0.lock().unwrap();
        state.writes.push(buf.to_vec());
        if buf.len() >= 2 && STATUS_REQUEST_IDS.contains(&[buf[0], buf[1]]) {
            state.status_polls += 1;
        }
        if let Some(reply) = state.replies.pop_front() {
            state.rx.extend_from_slice(&reply);
        }
        Ok(state.write_cap.unwrap_or(buf.len()).min(buf.len()))
    }

    fn set_baud_rate(&mut self, _baud: u32) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_data_characteristics(
        &mut self,
        _data_bits: DataBits,
        _stop_bits: StopBits,
        _parity: Parity,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_flow_control(
        &mut self,
        _flow: FlowControl,
        _xon: u8,
        _xoff: u8,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    fn reset_device(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn purge(&mut self, _direction: PurgeDirection) -> Result<(), TransportError> {
        self.0.0.lock().unwrap().rx.clear();
        Ok(())
    }

    fn set_timeouts(&mut self, _read: Duration, _write: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    fn queued_bytes(&mut self) -> Result<u32, TransportError> {
        Ok(u32::try_from(self.0.0.lock().unwrap().rx.len()).unwrap())
    }
}

struct ScriptedBridge {
    devices: Vec<PortInfo>,
    link: ScriptedLink,
}

impl SerialBridge for ScriptedBridge {
    fn device_count(&self) -> Result<u32, TransportError> {
        Ok(u32::try_from(self.devices.len()).unwrap())
    }

    fn device_info(&self, index: u32) -> Result<PortInfo, TransportError> {
        self.devices
            .get(index as usize)
            .cloned()
            .ok_or_else(|| TransportError::General(format!("no device at index {index}")))
    }

    fn open(&self, serial_number: &str) -> Result<Box<dyn SerialPort>, TransportError> {
        if self.devices.iter().any(|d| d.serial_number == serial_number) {
            Ok(Box::new(ScriptedPort(self.link.clone())))
        } else {
            Err(TransportError::DeviceNotFound {
                serial_number: serial_number.to_string(),
            })
        }
    }
}

fn dc_servo_info(serial: &str) -> PortInfo {
    PortInfo {
        flags: 0,
        device_type: 5,
        id: 0x0403_FAF0,
        location_id: 21,
        serial_number: serial.to_string(),
        description: "TDC001 DC Motor Controller".to_string(),
    }
}

fn foreign_info() -> PortInfo {
    PortInfo {
        flags: 0,
        device_type: 5,
        id: 0x0402_5678,
        location_id: 22,
        serial_number: "A4004buX".to_string(),
        description: "Generic serial adapter".to_string(),
    }
}

/// Long-form DC-servo status frame carrying the given status word.
fn status_frame(status: u32) -> Vec<u8> {
    let mut frame = vec![0x91, 0x04, 0x0e, 0x00, 0x81, 0x50];
    frame.extend_from_slice(&1u16.to_le_bytes());
    frame.extend_from_slice(&0i32.to_le_bytes());
    frame.extend_from_slice(&[0u8; 4]);
    frame.extend_from_slice(&status.to_le_bytes());
    frame
}

/// Short-form terminal frame with the given message identifier.
fn terminal_frame(id: u16) -> Vec<u8> {
    let mut frame = id.to_le_bytes().to_vec();
    frame.extend_from_slice(&[0x01, 0x00, 0x01, 0x50]);
    frame
}

fn connected_session() -> (DeviceSession, ScriptedLink) {
    let link = ScriptedLink::default();
    let bridge = Arc::new(ScriptedBridge {
        devices: vec![dc_servo_info("83000001"), foreign_info()],
        link: link.clone(),
    });

    let mut directory = DeviceDirectory::new(bridge.clone());
    directory.enumerate().unwrap();

    let mut session = DeviceSession::new(bridge);
    session.connect("83000001", &directory).unwrap();
    (session, link)
}

fn fast_config() -> MotionConfig {
    MotionConfig {
        status_poll_timeout: Duration::ZERO,
        settle_delay: Duration::ZERO,
        ..MotionConfig::default()
    }
}

#[test]
fn home_completes_after_two_status_polls() {
    let (mut session, link) = connected_session();
    link.script(status_frame(0x0200));
    link.script(terminal_frame(0x0444));

    MotionController::with_config(&mut session, fast_config())
        .home()
        .unwrap();

    assert_eq!(link.status_polls(), 2);
    // first write is the move-home command itself
    assert_eq!(&link.writes()[0][0..2], &[0x43, 0x04]);
}

#[test]
fn home_fast_path_skips_completion_wait() {
    let (mut session, link) = connected_session();
    link.script(terminal_frame(0x0444));

    MotionController::with_config(&mut session, fast_config())
        .home()
        .unwrap();

    // the terminal arrived during the start phase; no further polls issued
    assert_eq!(link.status_polls(), 1);
}

#[test]
fn home_ignores_foreign_terminal() {
    let (mut session, link) = connected_session();
    // a move-complete terminal does not finish a homing operation
    link.script(terminal_frame(0x0464));
    link.script(status_frame(0x0200));
    link.script(status_frame(0x0400));

    MotionController::with_config(&mut session, fast_config())
        .home()
        .unwrap();

    assert_eq!(link.status_polls(), 3);
}

#[test]
fn move_relative_start_then_complete() {
    let (mut session, link) = connected_session();
    link.script(status_frame(0x00f0));
    link.script(status_frame(0x0000));

    MotionController::with_config(&mut session, fast_config())
        .move_relative(100_000)
        .unwrap();

    assert_eq!(link.status_polls(), 2);

    let writes = link.writes();
    // the long-form move command went out first, fully framed
    assert_eq!(writes[0].len(), 12);
    assert_eq!(&writes[0][0..2], &[0x48, 0x04]);
    assert_eq!(writes[0][4], 0xA1);
    assert_eq!(&writes[0][8..12], &100_000i32.to_le_bytes());
}

#[test]
fn move_relative_idle_status_does_not_complete_start_phase() {
    let (mut session, link) = connected_session();
    // idle before the move begins must not read as completion
    link.script(status_frame(0x0000));
    link.script(status_frame(0x00f0));
    link.script(status_frame(0x0000));

    MotionController::with_config(&mut session, fast_config())
        .move_relative(-500)
        .unwrap();

    assert_eq!(link.status_polls(), 3);
}

#[test]
fn move_command_write_failure_is_fatal() {
    let (mut session, link) = connected_session();
    link.0.lock().unwrap().write_cap = Some(3);

    let result = MotionController::with_config(&mut session, fast_config()).move_relative(100);
    assert!(matches!(
        result,
        Err(MotionError::CommandFailed(WriteError::ShortWrite { .. }))
    ));
}

#[test]
fn silent_device_hits_operation_deadline() {
    let (mut session, _link) = connected_session();

    let config = MotionConfig {
        status_poll_timeout: Duration::from_millis(100),
        settle_delay: Duration::ZERO,
        deadline: Some(Duration::from_millis(250)),
    };
    let result = MotionController::with_config(&mut session, config).home();

    assert!(matches!(
        result,
        Err(MotionError::OperationTimedOut { .. })
    ));
}

#[test]
fn connect_rejects_empty_and_unknown_serials() {
    let link = ScriptedLink::default();
    let bridge = Arc::new(ScriptedBridge {
        devices: vec![dc_servo_info("83000001")],
        link,
    });

    let mut directory = DeviceDirectory::new(bridge.clone());
    directory.enumerate().unwrap();

    let mut session = DeviceSession::new(bridge);
    assert!(matches!(
        session.connect("", &directory),
        Err(ConnectError::EmptySerialNumber)
    ));
    assert!(matches!(
        session.connect("99999999", &directory),
        Err(ConnectError::UnknownDevice(_))
    ));
    assert!(!session.is_connected());
}

#[test]
fn directory_snapshot_and_vendor_filter() {
    let link = ScriptedLink::default();
    let bridge = Arc::new(ScriptedBridge {
        devices: vec![dc_servo_info("83000001"), foreign_info()],
        link,
    });

    let mut directory = DeviceDirectory::new(bridge);
    let snapshot = directory.enumerate().unwrap();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(directory.vendor_serial_numbers(), vec!["83000001"]);

    let descriptor = directory.lookup("83000001").unwrap();
    assert!(descriptor.is_vendor_device());
    assert!(descriptor.is_motor());
    assert!(directory.lookup("gone").is_none());
}

#[test]
fn hardware_info_round_trip() {
    let (mut session, link) = connected_session();

    let mut frame = vec![0x06, 0x00, 0x54, 0x00, 0x81, 0x50];
    frame.extend_from_slice(&83_000_001u32.to_le_bytes());
    frame.extend_from_slice(b"TDC001\0\0");
    frame.extend_from_slice(&83u16.to_le_bytes());
    frame.extend_from_slice(&[2, 0, 1, 0]);
    frame.extend_from_slice(&[0u8; 48]);
    frame.extend_from_slice(&[0u8; 12]);
    frame.extend_from_slice(&0x0201u16.to_le_bytes());
    frame.extend_from_slice(&1u16.to_le_bytes());
    frame.extend_from_slice(&1u16.to_le_bytes());
    link.script(frame);

    let info = session.hardware_info().unwrap();
    assert_eq!(info.serial_number, 83_000_001);
    assert_eq!(info.model, "TDC001");
    assert_eq!(info.channel_count, 1);
}
