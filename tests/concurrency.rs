// Real-time thread against one or more worker threads on the same slots.
// Values carry their own checksum so a torn copy is detectable.
mod common;

use common::{forged, plug};
use lv2_props::Core::{parse_atom, PropsError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

fn tagged(v: u32) -> i64 {
    ((v as i64) << 32) | v as i64
}

fn untag(raw: i64) -> u32 {
    let (hi, lo) = ((raw >> 32) as u32, raw as u32);
    assert_eq!(hi, lo, "torn value {raw:#x}");
    lo
}

fn long_of(atom: &[u8]) -> i64 {
    let atom = parse_atom(atom).unwrap();
    i64::from_ne_bytes(atom.body.try_into().unwrap())
}

#[test]
fn exports_arrive_in_order_without_tearing() {
    const ROUNDS: u32 = 20_000;
    let plug = plug();
    let long = plug.urid("long");
    let (props, mut rt) = (plug.props, plug.rt);
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(2));

    let rt_thread = {
        let done = done.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            let mut busy = 0u32;
            for v in 1..=ROUNDS {
                rt.state_mut().long = tagged(v);
                match rt.mark_changed_for_export(long) {
                    Ok(()) => {}
                    Err(PropsError::HandoffBusy) => busy += 1,
                    Err(e) => panic!("unexpected {e}"),
                }
            }
            // the final value has to get through
            while rt.mark_changed_for_export(long).is_err() {
                std::hint::spin_loop();
            }
            done.store(true, Ordering::Release);
            busy
        })
    };

    let worker = thread::spawn(move || {
        barrier.wait();
        let mut last = 0u32;
        let mut seen = 0usize;
        loop {
            let finished = done.load(Ordering::Acquire);
            match props.drain_for_export(long) {
                Ok(Some(atom)) => {
                    let v = untag(long_of(&atom));
                    assert!(v >= last, "went back from {last} to {v}");
                    last = v;
                    seen += 1;
                }
                Ok(None) | Err(PropsError::HandoffBusy) => {}
                Err(e) => panic!("unexpected {e}"),
            }
            if finished && props.pending_count() == 0 {
                break;
            }
            if fastrand::u8(..) < 8 {
                thread::yield_now();
            }
        }
        (last, seen)
    });

    let busy = rt_thread.join().unwrap();
    let (last, seen) = worker.join().unwrap();
    println!("exports seen: {seen}, marks refused: {busy}");
    assert_eq!(last, ROUNDS);
    assert!(seen >= 1);
}

#[test]
fn competing_importers_never_tear_live_state() {
    const WORKERS: usize = 4;
    const PER_WORKER: u32 = 5_000;
    let plug = plug();
    let long = plug.urid("long");
    let string = plug.urid("string");
    let (props, mut rt) = (plug.props, plug.rt);
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(WORKERS + 1));

    let mut workers = Vec::with_capacity(WORKERS);
    for w in 0..WORKERS {
        let props = props.clone();
        let barrier = barrier.clone();
        workers.push(thread::spawn(move || {
            barrier.wait();
            let mut staged = 0u32;
            for i in 0..PER_WORKER {
                let v = (w as u32) * PER_WORKER + i + 1;
                let atom = forged(&props, |f| {
                    f.long(tagged(v));
                });
                match props.accept_for_import(long, &atom) {
                    Ok(()) => staged += 1,
                    Err(PropsError::HandoffBusy) => {}
                    Err(e) => panic!("unexpected {e}"),
                }

                // text of varying length, all bytes equal to its length
                let len = fastrand::usize(1..31);
                let text = char::from(b'a' + len as u8 % 26).to_string().repeat(len);
                let atom = forged(&props, |f| {
                    f.string(&text);
                });
                match props.accept_for_import(string, &atom) {
                    Ok(()) | Err(PropsError::HandoffBusy) => {}
                    Err(e) => panic!("unexpected {e}"),
                }
            }
            staged
        }));
    }

    let rt_thread = {
        let done = done.clone();
        thread::spawn(move || {
            barrier.wait();
            let mut adopted = 0usize;
            loop {
                let finished = done.load(Ordering::Acquire);
                adopted += rt.drain_all_for_import();

                let v = untag(rt.state().long);
                assert!(v <= WORKERS as u32 * PER_WORKER);

                let s = rt.state().string;
                let len = s.iter().position(|&b| b == 0).unwrap();
                let expected = b'a' + len as u8 % 26;
                assert!(
                    len == 0 || s[..len].iter().all(|&b| b == expected),
                    "torn text {:?}",
                    &s[..len]
                );
                assert!(s[len..].iter().all(|&b| b == 0), "stale tail");

                if finished {
                    break;
                }
            }
            (rt, adopted)
        })
    };

    let staged: u32 = workers.into_iter().map(|w| w.join().unwrap()).sum();
    done.store(true, Ordering::Release);
    let (mut rt, adopted) = rt_thread.join().unwrap();

    println!("staged: {staged}, adopted: {adopted}");
    assert!(staged > 0);
    assert!(adopted > 0);
    assert_eq!(rt.drain_all_for_import(), 0);
    assert_eq!(props.pending_count(), 0);
}

#[test]
fn mixed_traffic_on_one_slot_settles() {
    const ROUNDS: u32 = 10_000;
    let plug = plug();
    let long = plug.urid("long");
    let (props, mut rt) = (plug.props, plug.rt);
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(2));

    let worker = {
        let done = done.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            let mut exported = 0usize;
            for i in 0..ROUNDS {
                if fastrand::bool() {
                    let atom = forged(&props, |f| {
                        f.long(tagged(i));
                    });
                    let _ = props.accept_for_import(long, &atom);
                }
                match props.drain_for_export(long) {
                    Ok(Some(atom)) => {
                        untag(long_of(&atom));
                        exported += 1;
                    }
                    Ok(None) | Err(PropsError::HandoffBusy) => {}
                    Err(e) => panic!("unexpected {e}"),
                }
            }
            done.store(true, Ordering::Release);
            (props, exported)
        })
    };

    barrier.wait();
    let mut v = 0u32;
    while !done.load(Ordering::Acquire) {
        rt.drain_for_import(long).unwrap();
        untag(rt.state().long);
        v = v.wrapping_add(1);
        rt.state_mut().long = tagged(v);
        let _ = rt.mark_changed_for_export(long);
    }

    let (props, exported) = worker.join().unwrap();
    println!("exported: {exported}");

    // single-threaded from here: drain whatever is left
    rt.drain_all_for_import();
    props.drain_all_for_export();
    assert_eq!(props.pending_count(), 0);
}
