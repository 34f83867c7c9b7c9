mod platform_provider;
mod static_provider;

pub use platform_provider::PlatformAdapterConfigProvider;
pub use static_provider::StaticAdapterConfigProvider;
