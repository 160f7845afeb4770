/// A submodule that renders province records in canonical script form.
mod render;
pub use render::{verify_render, ProvinceBlock};

/// A submodule that writes the regenerated setup and localization files.
mod writer;
pub use writer::{
    render_file, render_localization, write_changed, write_localization, WriteError,
};
