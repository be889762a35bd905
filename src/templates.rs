//! Folder-backed template rendering with minijinja.

use std::path::{Path, PathBuf};

use minijinja::{Environment, path_loader};
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::response::Response;

/// Templates loaded on demand from a folder.
///
/// Registered in the app's [`Container`](crate::Container) when configured,
/// so injected controllers can fetch it with `container.get::<Templates>()`.
pub struct Templates {
    env: Environment<'static>,
    folder: PathBuf,
}

impl Templates {
    /// Creates an environment reading templates from `folder`.
    ///
    /// With `debug_mode` on, render errors carry the template source context
    /// and the `debug()` function is available inside templates.
    pub fn new(folder: impl Into<PathBuf>, debug_mode: bool) -> Self {
        let folder = folder.into();
        let mut env = Environment::new();
        env.set_loader(path_loader(&folder));
        env.set_debug(debug_mode);
        debug!(folder = %folder.display(), debug = debug_mode, "templates configured");
        Self { env, folder }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Renders the named template with `data` as its context.
    pub fn render_to_string(&self, name: &str, data: impl Serialize) -> Result<String, Error> {
        let template = self.env.get_template(name)?;
        Ok(template.render(data)?)
    }

    /// Renders the named template into a `200 OK` HTML response.
    pub fn render(&self, name: &str, data: impl Serialize) -> Result<Response, Error> {
        self.render_to_string(name, data).map(Response::html)
    }

    /// Access to the underlying environment for registering filters,
    /// functions or globals (a translator, for instance).
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}
