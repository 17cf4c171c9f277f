// In demos/plugin_host.rs
//
// A toy host: one "audio" thread owning the live state, one worker thread
// pushing patch:Set messages and printing the notifications that come back.
//
//   cargo run --example plugin_host -- [blocks] [--auto-exit]
use lv2_props::Core::{parse_atom, HashUridMap, UridMap};
use lv2_props::Props::{
    Access, PatchResponse, PropState, RegistryBuilder, ValueDescriptor, ValueType,
};
use memoffset::offset_of;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const PLUGIN: &str = "urn:example:gain";

#[repr(C)]
#[derive(Copy, Clone, Default)]
struct GainState {
    gain: f32,
    peak: f32,
    blocks: i64,
}

unsafe impl PropState for GainState {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = env::args().collect();
    let max_blocks: u64 = match args.get(1) {
        Some(n) if n != "--auto-exit" => n.parse()?,
        _ => 2_000,
    };
    let auto_exit = args.iter().any(|a| a == "--auto-exit");

    let map = Arc::new(HashUridMap::new());
    let (props, mut rt) = RegistryBuilder::new(PLUGIN)
        .with_descriptor(ValueDescriptor::new(
            "urn:example:gain#gain",
            ValueType::Float,
            offset_of!(GainState, gain),
        ))
        .with_descriptor(
            ValueDescriptor::new(
                "urn:example:gain#peak",
                ValueType::Float,
                offset_of!(GainState, peak),
            )
            .access(Access::Read),
        )
        .with_descriptor(
            ValueDescriptor::new(
                "urn:example:gain#blocks",
                ValueType::Long,
                offset_of!(GainState, blocks),
            )
            .access(Access::Read),
        )
        .build(
            GainState {
                gain: 1.0,
                ..Default::default()
            },
            GainState::default(),
            map.clone(),
        )?;

    let gain = map.map("urn:example:gain#gain").ok_or("gain not mapped")?;
    let peak = map.map("urn:example:gain#peak").ok_or("peak not mapped")?;
    let blocks = map.map("urn:example:gain#blocks").ok_or("blocks not mapped")?;

    let keep_alive = Arc::new(AtomicBool::new(true));
    let keep_alive_for_handler = Arc::clone(&keep_alive);

    // Handle Ctrl+C to stop both threads
    ctrlc::set_handler(move || {
        keep_alive_for_handler.store(false, Ordering::SeqCst);
    })?;

    println!("Host: {props:?}");

    let audio = {
        let keep_alive = Arc::clone(&keep_alive);
        thread::spawn(move || {
            let mut n = 0u64;
            while keep_alive.load(Ordering::SeqCst) && (!auto_exit || n < max_blocks) {
                rt.drain_all_for_import();

                // fake signal: a sine through the gain stage
                let input = ((n as f32) * 0.05).sin().abs();
                let state = rt.state_mut();
                state.peak = input * state.gain;
                state.blocks = n as i64;

                // a refused mark is retried next block
                let _ = rt.mark_changed_for_export(peak);
                if n % 100 == 0 {
                    let _ = rt.mark_changed_for_export(blocks);
                }

                n += 1;
                thread::sleep(Duration::from_millis(1));
            }
            n
        })
    };

    let urids = *props.urids();
    let subject = props.subject();
    let mut round = 0u32;
    while keep_alive.load(Ordering::SeqCst) && !audio.is_finished() {
        if round % 50 == 0 {
            let value = 0.25 + fastrand::f32();
            let message = {
                let mut forge = props.forge();
                forge.object(0, urids.patch_set.get(), |f| {
                    f.key(urids.patch_subject).urid(subject);
                    f.key(urids.patch_property).urid(gain);
                    f.key(urids.patch_value).float(value);
                });
                forge.finish()
            };
            match props.handle_patch(&message) {
                Ok(PatchResponse::Applied(_)) => println!("Worker: gain -> {value:.3}"),
                Ok(other) => println!("Worker: unexpected {other:?}"),
                Err(e) if e.is_retryable() => {}
                Err(e) => eprintln!("Worker: set failed: {e}"),
            }
        }

        for note in props.collect_notifications() {
            let object = parse_atom(&note)?.object()?;
            let property = object
                .get(urids.patch_property.get())?
                .and_then(|a| a.as_urid());
            let value = object.get(urids.patch_value.get())?;
            if let (Some(property), Some(value)) = (property, value) {
                if property == blocks && value.body.len() == 8 {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(value.body);
                    println!("Worker: {} blocks processed", i64::from_ne_bytes(raw));
                } else if property == peak && round % 100 == 0 && value.body.len() == 4 {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(value.body);
                    println!("Worker: peak {:.3}", f32::from_ne_bytes(raw));
                }
            }
        }

        round += 1;
        thread::sleep(Duration::from_millis(10));
    }

    keep_alive.store(false, Ordering::SeqCst);
    let processed = audio.join().map_err(|_| "audio thread panicked")?;
    println!("Host: processed {processed} blocks, shutting down");
    Ok(())
}
