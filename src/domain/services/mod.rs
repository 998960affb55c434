mod fallback;

pub use fallback::FallbackSelector;
