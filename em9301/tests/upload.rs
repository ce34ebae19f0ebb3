use em9301::crc::crc32;
use em9301::{
    CommandFrame, ContainerError, ContainerHeader, Containers, NextCommand, Opcode, PatchUpload,
    UploadError, UploadPhase, UploadSession, CONTAINER_MAGIC,
};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn container(total_size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(total_size);
    data.extend_from_slice(&CONTAINER_MAGIC.to_le_bytes());
    data.extend_from_slice(&(total_size as u32).to_le_bytes());
    data.extend((8..total_size).map(|i| (i * 7) as u8));
    data
}

/// A decoded patch command.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Start { data: Vec<u8> },
    Continue { sequence_number: u16, data: Vec<u8> },
    Reset,
}

fn decode(frame: &CommandFrame) -> Frame {
    let parameters = frame.parameters();
    assert_eq!(frame.len(), 3 + parameters.len());

    match frame.opcode() {
        Some(Opcode::WritePatchStart) => {
            assert_eq!(parameters[0], 0x00, "destination must be iRAM1");
            let crc = u32::from_le_bytes(parameters[1..5].try_into().unwrap());
            let data = parameters[5..].to_vec();
            assert!(data.len() <= 59);
            assert_eq!(crc, crc32(&data));
            Frame::Start { data }
        }
        Some(Opcode::WritePatchContinue) => {
            let sequence_number = u16::from_le_bytes([parameters[0], parameters[1]]);
            let crc = u32::from_le_bytes(parameters[2..6].try_into().unwrap());
            let data = parameters[6..].to_vec();
            assert!(data.len() <= 58);
            assert_eq!(crc, crc32(&data));
            Frame::Continue {
                sequence_number,
                data,
            }
        }
        Some(Opcode::CpuReset) => {
            assert!(parameters.is_empty());
            Frame::Reset
        }
        other => panic!("unexpected command {other:?}"),
    }
}

/// Drive a session to completion, returning all frames and the final result.
fn run(blob: &[u8]) -> (Vec<Frame>, Result<NextCommand, UploadError>) {
    let mut session = UploadSession::new();
    let mut frames = vec![];

    loop {
        let mut frame = CommandFrame::new();
        match session.produce_next_command(blob, &mut frame) {
            Ok(NextCommand::Command) => frames.push(decode(&frame)),
            result => return (frames, result),
        }
        assert!(frames.len() < 100_000, "upload does not terminate");
    }
}

#[test_case(8; "header only")]
#[test_case(20; "short")]
#[test_case(59; "fills start frame")]
#[test_case(60; "one byte into continue")]
#[test_case(117; "fills first continue")]
#[test_case(118; "one byte into second continue")]
#[test_case(4096; "large")]
fn single_container(size: usize) {
    let blob = container(size);

    let (frames, result) = run(&blob);

    assert_eq!(result, Ok(NextCommand::Done));

    let continues = size.saturating_sub(59).div_ceil(58);
    assert_eq!(frames.len(), 1 + continues + 1);
    assert!(matches!(frames.first(), Some(Frame::Start { .. })));
    assert_eq!(frames.last(), Some(&Frame::Reset));

    let mut uploaded = vec![];
    let mut expected_sequence = 1;
    for frame in &frames {
        match frame {
            Frame::Start { data } => uploaded.extend_from_slice(data),
            Frame::Continue {
                sequence_number,
                data,
            } => {
                assert_eq!(*sequence_number, expected_sequence);
                expected_sequence += 1;
                uploaded.extend_from_slice(data);
            }
            Frame::Reset => {}
        }
    }
    assert_eq!(uploaded, blob);

    let header = ContainerHeader::parse(&blob, 0).unwrap();
    assert_eq!(header.command_count(), 1 + continues);
}

#[test]
fn small_container_needs_only_start() {
    let blob = container(40);

    let (frames, _) = run(&blob);

    assert_eq!(
        frames,
        vec![
            Frame::Start {
                data: blob.clone()
            },
            Frame::Reset
        ]
    );
}

#[test]
fn multiple_containers_restart_sequence_numbers() {
    let sizes = [300, 59, 130];
    let blob: Vec<u8> = sizes.iter().flat_map(|&size| container(size)).collect();

    let (frames, result) = run(&blob);
    assert_eq!(result, Ok(NextCommand::Done));

    let mut per_container: Vec<Vec<u16>> = vec![];
    for frame in &frames {
        match frame {
            Frame::Start { .. } => per_container.push(vec![]),
            Frame::Continue {
                sequence_number, ..
            } => per_container.last_mut().unwrap().push(*sequence_number),
            Frame::Reset => {}
        }
    }

    assert_eq!(per_container, vec![vec![1, 2, 3, 4, 5], vec![], vec![1, 2]]);
    assert_eq!(frames.iter().filter(|f| **f == Frame::Reset).count(), 1);
}

#[test]
fn corrupted_magic_halts_upload() {
    let mut blob = container(100);
    blob.extend(container(100));
    blob.extend(container(100));
    blob[200] ^= 0xff;

    let (frames, result) = run(&blob);

    // Both frames of the first container and both of the second, no reset.
    assert_eq!(frames.len(), 4);
    assert!(!frames.contains(&Frame::Reset));
    assert_eq!(
        result,
        Err(UploadError::MalformedContainer {
            offset: 200,
            source: ContainerError::BadMagic {
                expected: CONTAINER_MAGIC,
                found: CONTAINER_MAGIC ^ 0xff,
            },
        })
    );
}

#[test]
fn corrupted_first_container_produces_nothing() {
    let mut blob = container(100);
    blob[3] = 0;

    let (frames, result) = run(&blob);

    assert!(frames.is_empty());
    assert!(matches!(
        result,
        Err(UploadError::MalformedContainer { offset: 0, .. })
    ));
}

#[test_case(
    { let mut blob = container(50); blob.truncate(30); blob },
    ContainerError::Overrun { end: 50, blob_len: 30 };
    "container longer than blob"
)]
#[test_case(
    { let mut blob = container(50); blob.extend_from_slice(&[0x33, 0x39, 0x6d]); blob },
    ContainerError::Truncated { available: 3 };
    "trailing bytes"
)]
#[test_case(
    { let mut blob = container(50); blob[4..8].copy_from_slice(&[0; 4]); blob },
    ContainerError::InvalidSize { size: 0 };
    "zero size"
)]
fn structural_errors_are_terminal(blob: Vec<u8>, expected: ContainerError) {
    let (_, result) = run(&blob);

    let Err(UploadError::MalformedContainer { source, .. }) = result else {
        panic!("expected a malformed container, got {result:?}");
    };
    assert_eq!(source, expected);
}

#[test]
fn done_is_sticky() {
    let blob = container(70);
    let mut session = UploadSession::new();
    let mut frame = CommandFrame::new();

    while session.produce_next_command(&blob, &mut frame) == Ok(NextCommand::Command) {}
    let cursor = session.cursor();

    for _ in 0..5 {
        assert_eq!(
            session.produce_next_command(&blob, &mut frame),
            Ok(NextCommand::Done)
        );
    }
    assert_eq!(session.phase(), UploadPhase::Done);
    assert_eq!(session.cursor(), cursor);
    assert_eq!(cursor, blob.len());
}

#[test]
fn cursor_never_decreases() {
    let blob: Vec<u8> = [500, 9, 61].iter().flat_map(|&size| container(size)).collect();
    let mut session = UploadSession::new();
    let mut frame = CommandFrame::new();
    let mut last = 0;

    while session.produce_next_command(&blob, &mut frame) == Ok(NextCommand::Command) {
        assert!(session.cursor() >= last);
        assert!(session.cursor() <= blob.len());
        last = session.cursor();
    }
}

#[test]
fn independent_sessions_do_not_interfere() {
    let a = container(200);
    let b: Vec<u8> = [30, 30].iter().flat_map(|&size| container(size)).collect();

    let mut first = UploadSession::new();
    let mut second = UploadSession::new();
    let mut frame = CommandFrame::new();

    first.produce_next_command(&a, &mut frame).unwrap();
    second.produce_next_command(&b, &mut frame).unwrap();
    first.produce_next_command(&a, &mut frame).unwrap();

    assert_eq!(first.cursor(), 59 + 58);
    assert_eq!(second.cursor(), 30);
    assert_eq!(second.phase(), UploadPhase::BetweenContainers);
}

#[test]
fn iterator_matches_session() {
    let blob: Vec<u8> = [150, 10].iter().flat_map(|&size| container(size)).collect();

    let from_iterator: Vec<Frame> = PatchUpload::new(&blob)
        .map(|frame| decode(&frame.unwrap()))
        .collect();
    let (from_session, _) = run(&blob);

    assert_eq!(from_iterator, from_session);
}

#[test]
fn containers_summary() {
    let blob: Vec<u8> = [150, 10].iter().flat_map(|&size| container(size)).collect();

    let headers: Vec<ContainerHeader> = Containers::new(&blob).map(Result::unwrap).collect();

    assert_eq!(
        headers,
        vec![
            ContainerHeader {
                offset: 0,
                size: 150
            },
            ContainerHeader {
                offset: 150,
                size: 10
            },
        ]
    );
    assert_eq!(
        headers.iter().map(ContainerHeader::command_count).sum::<usize>() + 1,
        run(&blob).0.len()
    );
}
