//! Performance benchmarks for the per-frame relay path
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;
use tokio::sync::mpsc;

use callrelay_gateway::core::realtime::classify;
use callrelay_gateway::{
    AudioFrame, ChannelSink, ChannelSource, ModelSessionConfig, RealtimeModelAdapter,
    TelephonyMessage, TelephonySocketAdapter,
};

/// 20 ms of 8 kHz μ-law, base64 encoded
fn twenty_ms_payload() -> String {
    "fn5+fn5+".repeat(160 / 6 + 1)
}

fn bench_telephony_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("telephony_parsing");
    group.measurement_time(Duration::from_secs(5));

    let media = format!(
        r#"{{"event":"media","sequenceNumber":"3","media":{{"track":"inbound","chunk":"1","timestamp":"5","payload":"{}"}},"streamSid":"MZ18ad3ab5a668481ce02b83e7395059f0"}}"#,
        twenty_ms_payload()
    );
    let start = r#"{"event":"start","sequenceNumber":"1","start":{"accountSid":"AC123","streamSid":"MZ18ad3ab5a668481ce02b83e7395059f0","callSid":"CA123","tracks":["inbound"],"mediaFormat":{"encoding":"audio/x-mulaw","sampleRate":8000,"channels":1}},"streamSid":"MZ18ad3ab5a668481ce02b83e7395059f0"}"#;
    let mark = r#"{"event":"mark","streamSid":"MZ1","mark":{"name":"greeting"}}"#;

    for (name, msg) in [("media", media.as_str()), ("start", start), ("mark", mark)] {
        group.throughput(Throughput::Bytes(msg.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, msg.len()), &msg, |b, msg| {
            b.iter(|| {
                let _ = TelephonyMessage::parse(black_box(msg));
            });
        });
    }

    group.finish();
}

fn bench_model_event_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_event_classification");
    group.measurement_time(Duration::from_secs(5));

    let delta = format!(
        r#"{{"type":"response.audio.delta","event_id":"evt_1","response_id":"resp_1","item_id":"item_1","output_index":0,"content_index":0,"delta":"{}"}}"#,
        twenty_ms_payload()
    );
    let transcript = r#"{"type":"conversation.item.input_audio_transcription.completed","item_id":"item_1","content_index":0,"transcript":"I would like to book a table for two."}"#;
    let unknown = r#"{"type":"response.audio_transcript.delta","event_id":"evt_2","delta":"Sure"}"#;

    for (name, msg) in [
        ("audio_delta", delta.as_str()),
        ("transcript", transcript),
        ("unknown", unknown),
    ] {
        group.throughput(Throughput::Bytes(msg.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, msg.len()), &msg, |b, msg| {
            b.iter(|| {
                let _ = classify(black_box(msg));
            });
        });
    }

    group.finish();
}

fn bench_frame_forwarding(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("frame_forwarding");
    group.measurement_time(Duration::from_secs(5));

    let payload = twenty_ms_payload();

    group.bench_function("telephony_send_audio", |b| {
        let (tx, mut rx) = mpsc::channel(1);
        let (_in_tx, in_rx) = mpsc::channel::<String>(1);
        let (mut sender, _receiver) = TelephonySocketAdapter::from_transport(
            Box::new(ChannelSink::new(tx)),
            Box::new(ChannelSource::new(in_rx)),
        )
        .split();
        let frame = AudioFrame::outbound(payload.clone());

        b.iter(|| {
            runtime.block_on(async {
                sender
                    .send_audio(Some("MZ1"), black_box(&frame))
                    .await
                    .unwrap();
                rx.recv().await.unwrap();
            })
        });
    });

    group.bench_function("model_send_inbound_audio", |b| {
        let (tx, mut rx) = mpsc::channel(1);
        let (_in_tx, in_rx) = mpsc::channel::<String>(1);
        let (mut sender, _receiver) = RealtimeModelAdapter::from_transport(
            Box::new(ChannelSink::new(tx)),
            Box::new(ChannelSource::new(in_rx)),
        )
        .split();
        let frame = AudioFrame::inbound(payload.clone());

        b.iter(|| {
            runtime.block_on(async {
                sender.send_inbound_audio(black_box(&frame)).await.unwrap();
                rx.recv().await.unwrap();
            })
        });
    });

    group.finish();
}

fn bench_session_serialization(c: &mut Criterion) {
    let session = ModelSessionConfig {
        instructions: "You are a friendly receptionist for a dental clinic. ".repeat(20),
        ..Default::default()
    };

    c.bench_function("session_update_serialization", |b| {
        b.iter(|| {
            let _ = serde_json::to_string(&black_box(&session).to_wire());
        });
    });
}

criterion_group!(
    benches,
    bench_telephony_parsing,
    bench_model_event_classification,
    bench_frame_forwarding,
    bench_session_serialization,
);
criterion_main!(benches);
