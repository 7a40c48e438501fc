/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    super::{
        segment::{SegmentKind, Sequence, HEADER_SIZE},
        testing::*,
    },
};

const WHITE: (u8, u8, u8, u8, u8) = (1, 235, 128, 128, 255);

#[test]
fn test_ds_minimal() {

    let bytes = StreamBuilder::new().pts(900_000).pcs(EPOCH_START, 0).end().build();
    let (_, display_sets) = read_all(bytes).unwrap();

    assert_eq!(display_sets.len(), 1);

    let ds = &display_sets[0];

    assert_eq!(ds.sequence, 0);
    assert_eq!(ds.previous, None);
    assert_eq!(ds.start_time(), Duration::from_secs(10));
    assert_eq!(ds.composition_state(), CompositionState::EpochStart);
    assert!(ds.window_definitions.is_empty());
    assert!(ds.palette_definitions.is_empty());
    assert!(ds.object_definitions.is_empty());
    assert_eq!(ds.dimensions(), Err(ResolveError::MissingFirstObject));
    assert!(ds.object_data().is_empty());
}

#[test]
fn test_ds_state_transitions() {

    let bytes = StreamBuilder::new().pcs(EPOCH_START, 0).end().build();
    let mut reader = DisplaySetReader::new();

    assert_eq!(reader.state(), ReaderState::AwaitingHeader);
    assert_eq!(reader.needed(), HEADER_SIZE);

    assert_eq!(reader.consume(ByteView::from(bytes[..13].to_vec())), Ok(19));

    match reader.state() {
        ReaderState::AwaitingPayload(header) => {
            assert_eq!(header.kind, SegmentKind::PresentationComposition);
            assert_eq!(header.size, 19);
        }
        state => panic!("unexpected state: {:?}", state),
    }

    assert_eq!(reader.consume(ByteView::from(bytes[13..32].to_vec())), Ok(HEADER_SIZE));
    assert_eq!(reader.state(), ReaderState::AwaitingHeader);
    assert!(!reader.is_ready());
    assert!(reader.take().is_none());

    // End segments carry no payload.
    assert_eq!(reader.consume(ByteView::from(bytes[32..].to_vec())), Ok(0));
    assert!(!reader.is_ready());
    assert_eq!(reader.consume(ByteView::new()), Ok(HEADER_SIZE));
    assert!(reader.is_ready());

    let ds = reader.take().unwrap();

    assert_eq!(ds.sequence, 0);
    assert!(!reader.is_ready());
    assert!(reader.take().is_none());
}

#[test]
fn test_ds_collects_segments_in_order() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 2)
        .wds(&[(0, 10, 20, 300, 40)])
        .pds(2, &[(0, 16, 128, 128, 0), WHITE])
        .wds(&[(1, 10, 80, 300, 40)])
        .ods(5, FIRST, Some((4, 1)), &[0x01, 0x01])
        .ods(5, LAST, None, &[0x01, 0x01])
        .end()
        .build();
    let (_, display_sets) = read_all(bytes).unwrap();
    let ds = &display_sets[0];

    assert_eq!(ds.windows().map(|window| window.id).collect::<Vec<u8>>(), vec![0, 1]);
    assert_eq!(ds.palette(2).map(|pds| pds.entries.len()), Some(2));
    assert!(ds.palette(3).is_none());
    assert_eq!(ds.first_object().map(|ods| ods.sequence), Some(Sequence::First));
    assert_eq!(ds.dimensions(), Ok((4, 1)));
    assert_eq!(ds.object_data().to_vec(), vec![0x01, 0x01, 0x01, 0x01]);
    assert_eq!(ds.object_data().fragments().len(), 2);
}

#[test]
fn test_ds_accumulators_reset_after_end() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 0)
        .pds(0, &[WHITE])
        .ods(1, FIRST_AND_LAST, Some((1, 1)), &[0x01])
        .end()
        .pcs(NORMAL, 0)
        .end()
        .build();
    let (_, display_sets) = read_all(bytes).unwrap();

    assert_eq!(display_sets.len(), 2);
    assert_eq!(display_sets[1].sequence, 1);
    assert_eq!(display_sets[1].previous, Some(0));
    assert!(display_sets[1].palette_definitions.is_empty());
    assert!(display_sets[1].object_definitions.is_empty());
}

#[test]
fn test_ds_first_object_without_start_fragment() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 0)
        .ods(1, LAST, None, &[0x01])
        .end()
        .build();
    let (_, display_sets) = read_all(bytes).unwrap();

    assert!(display_sets[0].first_object().is_none());
    assert_eq!(display_sets[0].dimensions(), Err(ResolveError::MissingFirstObject));
}

#[test]
fn test_ds_duplicate_pcs() {

    let bytes = StreamBuilder::new().pcs(EPOCH_START, 0).pcs(NORMAL, 0).end().build();
    let err = read_all(bytes).unwrap_err();

    assert_eq!(err, ReadError::UnexpectedPresentationCompositionSegment);
    assert_eq!(err.kind(), ErrorKind::ProtocolSequencing);
}

#[test]
fn test_ds_segment_before_pcs() {

    let bytes = StreamBuilder::new().pds(0, &[WHITE]).pcs(EPOCH_START, 0).end().build();

    assert_eq!(
        read_all(bytes).unwrap_err(),
        ReadError::UnexpectedSegment(SegmentKind::PaletteDefinition),
    );

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 0)
        .end()
        .ods(1, FIRST_AND_LAST, Some((1, 1)), &[0x01])
        .build();

    assert_eq!(
        read_all(bytes).unwrap_err(),
        ReadError::UnexpectedSegment(SegmentKind::ObjectDefinition),
    );
}

#[test]
fn test_ds_end_before_pcs() {

    let bytes = StreamBuilder::new().end().build();
    let err = read_all(bytes).unwrap_err();

    assert_eq!(err, ReadError::UnexpectedEndSegment);
    assert_eq!(err.kind(), ErrorKind::ProtocolSequencing);
}

#[test]
fn test_ds_rejects_wrong_length() {

    let bytes = StreamBuilder::new().pcs(EPOCH_START, 0).end().build();
    let mut reader = DisplaySetReader::new();

    assert_eq!(
        reader.consume(ByteView::from(bytes[..12].to_vec())),
        Err(ReadError::UnexpectedLength { expected: HEADER_SIZE, actual: 12 }),
    );
    assert_eq!(reader.state(), ReaderState::AwaitingHeader);
    assert_eq!(reader.consume(ByteView::from(bytes[..13].to_vec())), Ok(19));

    let mut payload = bytes[13..32].to_vec();

    payload.extend_from_slice(&[0x00, 0x00, 0x00]);

    let err = reader.consume(ByteView::from(payload)).unwrap_err();

    assert_eq!(err, ReadError::UnexpectedLength { expected: 19, actual: 22 });
    assert_eq!(err.kind(), ErrorKind::ProtocolSequencing);
    assert!(matches!(reader.state(), ReaderState::AwaitingPayload(_)));
    assert_eq!(reader.consume(ByteView::from(bytes[13..32].to_vec())), Ok(HEADER_SIZE));
}

#[test]
fn test_ds_bad_magic_number() {

    let mut bytes = StreamBuilder::new().pcs(EPOCH_START, 0).end().build();

    bytes[0] = 0x00;

    let err = read_all(bytes).unwrap_err();

    assert!(matches!(err, ReadError::SegmentError { .. }));
    assert_eq!(err.kind(), ErrorKind::MalformedHeader);
}

#[test]
fn test_palette_from_own_definitions() {

    let bytes = StreamBuilder::new().pcs(EPOCH_START, 7).pds(7, &[WHITE]).end().build();
    let (reader, display_sets) = read_all(bytes).unwrap();
    let pds = reader.arena().palette(&display_sets[0]).unwrap();

    assert_eq!(pds.id, 7);
}

#[test]
fn test_palette_falls_back_when_normal() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 3)
        .pds(3, &[WHITE])
        .end()
        .pcs(NORMAL, 3)
        .end()
        .pcs(NORMAL, 3)
        .end()
        .build();
    let (reader, display_sets) = read_all(bytes).unwrap();

    assert_eq!(reader.arena().len(), 3);
    for ds in display_sets.iter() {
        let pds = reader.arena().palette(ds).unwrap();
        assert_eq!(pds, &display_sets[0].palette_definitions[0]);
    }
}

#[test]
fn test_palette_does_not_fall_back_outside_normal() {

    for &state in [EPOCH_START, ACQUISITION_POINT].iter() {

        let bytes = StreamBuilder::new()
            .pcs(EPOCH_START, 3)
            .pds(3, &[WHITE])
            .end()
            .pcs(state, 3)
            .end()
            .build();
        let (reader, display_sets) = read_all(bytes).unwrap();
        let err = reader.arena().palette(&display_sets[1]).unwrap_err();

        assert_eq!(err, ResolveError::UnknownPalette { palette_id: 3 });
        assert_eq!(err.kind(), ErrorKind::MissingReference);
    }
}

#[test]
fn test_palette_chain_exhausted() {

    let bytes = StreamBuilder::new()
        .pcs(NORMAL, 0)
        .pds(0, &[WHITE])
        .end()
        .pcs(NORMAL, 1)
        .end()
        .build();
    let (reader, display_sets) = read_all(bytes).unwrap();

    assert_eq!(
        reader.arena().palette(&display_sets[1]),
        Err(ResolveError::UnresolvedPalette { palette_id: 1 }),
    );
}

#[test]
fn test_palette_chain_stops_at_epoch_start() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 0)
        .pds(0, &[WHITE])
        .end()
        .pcs(EPOCH_START, 1)
        .pds(1, &[WHITE])
        .end()
        .pcs(NORMAL, 0)
        .end()
        .build();
    let (reader, display_sets) = read_all(bytes).unwrap();

    assert_eq!(
        reader.arena().palette(&display_sets[2]),
        Err(ResolveError::UnknownPalette { palette_id: 0 }),
    );
}

#[test]
fn test_arena_keeps_earlier_epochs() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 0)
        .end()
        .pcs(NORMAL, 0)
        .end()
        .pcs(ACQUISITION_POINT, 0)
        .end()
        .pcs(NORMAL, 0)
        .end()
        .build();
    let (reader, display_sets) = read_all(bytes).unwrap();
    let arena = reader.arena();

    assert_eq!(display_sets.len(), 4);
    assert_eq!(arena.len(), 4);
    assert_eq!(arena.next_sequence(), 4);
    for (sequence, ds) in display_sets.iter().enumerate() {
        assert_eq!(arena.get(sequence), Some(ds));
    }
    assert!(arena.get(4).is_none());
    assert_eq!(arena.last().map(|ds| ds.previous), Some(Some(2)));
    assert_eq!(display_sets[2].previous, Some(1));
}

#[test]
fn test_palette_resolves_after_later_epoch() {

    let bytes = StreamBuilder::new()
        .pcs(EPOCH_START, 0)
        .pds(0, &[WHITE])
        .end()
        .pcs(NORMAL, 0)
        .end()
        .pcs(EPOCH_START, 1)
        .pds(1, &[WHITE])
        .end()
        .build();
    let (reader, display_sets) = read_all(bytes).unwrap();
    let pds = reader.arena().palette(&display_sets[1]).unwrap();

    assert_eq!(pds, &display_sets[0].palette_definitions[0]);
}
