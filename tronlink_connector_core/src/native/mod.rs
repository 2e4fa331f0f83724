// Native implementations

pub mod slot_host;

pub use slot_host::SlotHost;
