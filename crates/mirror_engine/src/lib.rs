//! Mirror engine: conversion, asset storage, shared state and the sync driver.
mod asset;
mod cache;
mod convert;
mod fetch;
mod persist;
mod registry;
mod remote;
mod sync;
mod types;

pub use asset::{
    content_hash, extension_for_mime, parse_data_uri, AssetError, AssetFile, AssetSink, ImageStore,
    PUBLIC_IMAGE_PREFIX,
};
pub use cache::ContentCache;
pub use convert::{Converter, MarkupConverter};
pub use fetch::{DocumentFetcher, FetchSettings, ReqwestDocumentFetcher};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use registry::{BroadcastReport, SubscriberId, SubscriberRegistry, Subscription, INBOX_CAPACITY};
pub use remote::parse_document;
pub use sync::{system_clock, Clock, StopOutcome, SyncEngine, SyncHandle, SyncOutcome, SyncSettings};
pub use types::{FailureKind, FetchError};
