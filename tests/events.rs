mod common;

use std::{sync::Arc, thread};

use color_eyre::Result;
use common::*;
use pretty_assertions::assert_eq;
use serial_looper::{
    error::Error,
    looper::Pipeline,
    mock::MockLines,
    records::{Edge, LineState, LineStatusRecord, Signal},
};

#[test]
fn transitions_are_masked_and_chained() -> Result<()> {
    let looper = looper();
    looper.set_events_mask(LineState(0b1111));

    let (collector, rx) = Collector::<LineStatusRecord>::new();
    looper.start_event_loop(collector, &mut MockLines::new(LineState(0b0000)))?;

    looper.insert_line_event(LineState(0b0011));
    looper.insert_line_event(LineState(0b1011));
    looper.set_events_mask(LineState(0b0011));
    looper.insert_line_event(LineState(0b1111));

    assert_eq!(
        receive_n(&rx, 3),
        vec![
            transition(0b0000, 0b0011),
            transition(0b0011, 0b1011),
            transition(0b0011, 0b0011),
        ]
    );

    looper.stop_event_loop()?;
    Ok(())
}

#[test]
fn first_transition_is_relative_to_current_line_state() -> Result<()> {
    let looper = looper();
    let (collector, rx) = Collector::<LineStatusRecord>::new();

    // DTR is outside the default mask, so it never shows up.
    let mut lines = MockLines::new(LineState::CTS | LineState::DSR | LineState::DTR);
    looper.start_event_loop(collector, &mut lines)?;

    looper.insert_line_event(LineState::DSR);

    let record: LineStatusRecord = receive_n(&rx, 1).remove(0);
    assert_eq!(record.previous(), LineState::CTS | LineState::DSR);
    assert_eq!(record.new_state(), LineState::DSR);
    assert_eq!(record.edge(Signal::Cts), Some(Edge::Falling));
    assert_eq!(record.edge(Signal::Dsr), None);

    looper.stop_event_loop()?;
    Ok(())
}

#[test]
fn mask_change_is_not_retroactive() -> Result<()> {
    let looper = looper();

    // Queued before the loop runs, with the default mask.
    looper.insert_line_event(LineState::CTS | LineState::RI);
    looper.set_events_mask(LineState::CTS);

    let (collector, rx) = Collector::<LineStatusRecord>::new();
    looper.start_event_loop(collector, &mut MockLines::default())?;
    looper.insert_line_event(LineState::CTS | LineState::RI);

    let records = receive_n(&rx, 2);
    assert_eq!(records[0].new_state(), LineState::CTS | LineState::RI);
    assert_eq!(records[1].new_state(), LineState::CTS);

    looper.stop_event_loop()?;
    Ok(())
}

#[test]
fn failed_line_state_read_is_reported() -> Result<()> {
    let looper = looper();
    let mut lines = MockLines::default();
    lines.fail_reads(true);

    let (collector, rx) = Collector::<LineStatusRecord>::new();
    let result = looper.start_event_loop(collector, &mut lines);

    assert!(matches!(result, Err(Error::LineStateQuery(_))));
    assert!(!looper.is_event_loop_running());

    // Once the port reads again, starting works.
    lines.fail_reads(false);
    let (collector, rx2) = Collector::<LineStatusRecord>::new();
    looper.start_event_loop(collector, &mut lines)?;

    looper.insert_line_event(LineState::RI);
    assert_eq!(receive_n(&rx2, 1), vec![transition(0, 0b1000)]);
    drop(rx);

    looper.stop_event_loop()?;
    Ok(())
}

#[test]
fn pause_does_not_hold_line_events() -> Result<()> {
    let looper = looper();
    looper.pause();

    let (collector, rx) = Collector::<LineStatusRecord>::new();
    looper.start_event_loop(collector, &mut MockLines::default())?;

    looper.insert_line_event(LineState::DCD);
    assert_eq!(receive_n(&rx, 1), vec![transition(0, 0b0100)]);

    looper.stop_event_loop()?;
    Ok(())
}

#[test]
fn double_start_is_rejected_without_side_effects() -> Result<()> {
    let looper = looper();
    let (collector, rx) = Collector::<LineStatusRecord>::new();
    looper.start_event_loop(collector, &mut MockLines::new(LineState::CTS))?;

    // A second start must not re-seed the baseline.
    let (other, _other_rx) = Collector::<LineStatusRecord>::new();
    let result = looper.start_event_loop(other, &mut MockLines::new(LineState::EMPTY));
    assert_eq!(result, Err(Error::AlreadyRunning(Pipeline::Event)));

    looper.insert_line_event(LineState::CTS | LineState::DSR);
    assert_eq!(receive_n(&rx, 1), vec![transition(0b0001, 0b0011)]);

    looper.stop_event_loop()?;
    Ok(())
}

#[test]
fn serialized_concurrent_reports_form_a_consistent_chain() -> Result<()> {
    let looper = Arc::new(looper_with_capacity(10_000));
    let (collector, rx) = Collector::<LineStatusRecord>::new();
    looper.start_event_loop(collector, &mut MockLines::default())?;

    let producers = (0..4)
        .map(|producer| {
            let looper = Arc::clone(&looper);
            thread::spawn(move || {
                for i in 0..250u32 {
                    looper.insert_line_event(LineState((producer + i) % 16));
                }
            })
        })
        .collect::<Vec<_>>();

    for producer in producers {
        producer.join().expect("Producer should not panic");
    }

    let records = receive_n(&rx, 1000);

    assert_eq!(records[0].previous(), LineState::EMPTY);
    for pair in records.windows(2) {
        assert_eq!(pair[1].previous(), pair[0].new_state());
    }

    looper.stop_event_loop()?;
    Ok(())
}
