//! Unity binary asset parser.
//!
//! Reads `UnityFS` archives and the serialized files inside them, and
//! decodes objects generically from their type trees rather than from
//! per-class Rust structs.
//!
//! ```rust,no_run
//! use unity_asset_binary::{AssetBundle, SerializedFile, asset::SerializedFileOptions};
//!
//! let data = std::fs::read("example.bundle")?;
//! let bundle = AssetBundle::parse(&data)?;
//! for node in bundle.serialized_file_nodes() {
//!     let file = SerializedFile::parse(bundle.node_data(node))?;
//!     let options = SerializedFileOptions::default();
//!     for obj in &file.objects {
//!         match file.deserialize_object(bundle.node_data(node), obj, &options) {
//!             Ok(value) => println!("{:?}", value),
//!             Err(err) => eprintln!("skipped object: {err}"),
//!         }
//!     }
//! }
//! # Ok::<(), unity_asset_binary::error::BinaryError>(())
//! ```

pub mod asset;
pub mod bundle;
pub mod compression;
pub mod error;
pub mod reader;
pub mod typetree;

pub use asset::SerializedFile;
pub use bundle::AssetBundle;
pub use error::{BinaryError, Result};
pub use reader::{BinaryReader, ByteOrder};
