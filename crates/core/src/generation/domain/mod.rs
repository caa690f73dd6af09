pub mod asset_provider;
