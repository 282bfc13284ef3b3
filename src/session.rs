//! What the user currently sees.
//!
//! A session owns the displayed cloud. Starting a new run drops the previous scene
//! before anything else happens, and `&mut self` keeps two runs from sharing one
//! session.
//!
//! [`Session::generate`] runs a whole request in one call. Callers that drive the
//! engine themselves, for example on another task, use [`Session::begin`] and
//! [`Session::finish`] instead and can show [`CloudState::Loading`] in between.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, ExportError};
use crate::extract::VisibleTextSource;
use crate::render::{CloudResult, Rasterizer, SvgScene};
use crate::settings::SettingsProvider;
use crate::WordCloud;

#[derive(Debug)]
pub struct RenderedCloud {
    pub result: CloudResult,
    pub scene: SvgScene,
}

#[derive(Debug)]
pub enum CloudState {
    Idle,
    Loading,
    Ready(RenderedCloud),
    Failed(Error),
}

pub struct Session {
    engine: WordCloud,
    rasterizer: Option<Rasterizer>,
    state: CloudState,
}

impl Session {
    pub fn new(engine: WordCloud) -> Self {
        Session {
            engine,
            rasterizer: None,
            state: CloudState::Idle,
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn state(&self) -> &CloudState {
        &self.state
    }

    pub fn engine(&self) -> &WordCloud {
        &self.engine
    }

    /// Drops the displayed cloud and marks a run as in progress.
    pub fn begin(&mut self) {
        self.state = CloudState::Loading;
    }

    /// Shows the outcome of the run started by [`Session::begin`].
    pub fn finish(&mut self, outcome: Result<CloudResult, Error>) -> &CloudState {
        self.state = match outcome {
            Ok(result) => {
                let scene = SvgScene::from_result(&result);
                CloudState::Ready(RenderedCloud { result, scene })
            }
            Err(err) => {
                warn!("Word cloud generation failed - error={}", err);
                CloudState::Failed(err)
            }
        };
        &self.state
    }

    pub async fn generate(
        &mut self,
        source: &dyn VisibleTextSource,
        settings: &dyn SettingsProvider,
    ) -> &CloudState {
        self.begin();
        let outcome = self.engine.generate(source, settings).await;
        self.finish(outcome)
    }

    fn rendered(&self) -> Result<&RenderedCloud, ExportError> {
        match &self.state {
            CloudState::Ready(cloud) => Ok(cloud),
            _ => Err(ExportError::NothingRendered),
        }
    }

    /// Writes the displayed cloud as PNG. A failure leaves the cloud in place.
    pub fn export_png(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let cloud = self.rendered()?;
        let rasterizer = self.rasterizer.as_ref().ok_or(ExportError::MissingFont)?;
        rasterizer.export(&cloud.result, dir)
    }

    pub fn export_svg(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        self.rendered()?.scene.export(dir)
    }
}
