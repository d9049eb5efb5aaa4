use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("geminius.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("geminius.client.request_errors");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("geminius.stream.chunks");
pub(crate) static STREAM_FRAMES: Counter = Counter::new("geminius.stream.frames");
pub(crate) static STREAM_FRAMES_SKIPPED: Counter = Counter::new("geminius.stream.frames_skipped");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("geminius.stream.errors");

pub(crate) static CHAT_TURNS: Counter = Counter::new("geminius.chat.turns");
pub(crate) static CHAT_CANCELLATIONS: Counter = Counter::new("geminius.chat.cancellations");

pub(crate) static HOSTING_REQUESTS: Counter = Counter::new("geminius.hosting.requests");
pub(crate) static HOSTING_CACHE_HITS: Counter = Counter::new("geminius.hosting.cache_hits");
pub(crate) static HOSTING_CACHE_MISSES: Counter = Counter::new("geminius.hosting.cache_misses");
pub(crate) static HOSTING_REVALIDATIONS: Counter = Counter::new("geminius.hosting.revalidations");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_FRAMES_SKIPPED);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_CANCELLATIONS);

    collector.register_counter(&HOSTING_REQUESTS);
    collector.register_counter(&HOSTING_CACHE_HITS);
    collector.register_counter(&HOSTING_CACHE_MISSES);
    collector.register_counter(&HOSTING_REVALIDATIONS);
}
