//! Skull stripping through the SynthStrip docker image

use crate::error::{QcError, Result};
use crate::volume::strip_nifti_ext;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Suffix of a skull-stripped volume, including its extension
pub const STRIPPED_SUFFIX: &str = "_skullstripped.nii.gz";

/// Removes non-brain tissue from a volume
///
/// Implementations write the stripped volume to `output` and report
/// failure as [`QcError::SkullStrip`].
pub trait SkullStripper {
    /// Strips `input` into `output`
    fn strip(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Where the stripped version of a volume is written: `<base>_skullstripped.nii.gz`
/// next to the input
pub fn stripped_path_for(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = format!("{}{}", strip_nifti_ext(&name), STRIPPED_SUFFIX);
    input.with_file_name(stripped)
}

/// Returns whether a file name is a skull-stripped output
pub fn is_stripped_output(file_name: &str) -> bool {
    let base = strip_nifti_ext(file_name);
    base.len() < file_name.len() && base.ends_with("_skullstripped")
}

/// SynthStrip run through `docker`
///
/// The input's parent directory is mounted at `/data` inside the container
/// and the output must live in the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthStrip {
    /// Docker image reference
    pub image: String,

    /// Platform passed to `docker pull` and `docker run`
    pub platform: String,

    /// Docker executable
    pub docker: String,
}

impl Default for SynthStrip {
    fn default() -> Self {
        Self {
            image: "freesurfer/synthstrip:latest".to_string(),
            platform: "linux/amd64".to_string(),
            docker: "docker".to_string(),
        }
    }
}

impl SynthStrip {
    /// Builder: Set the docker image
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Builder: Set the docker executable
    pub fn with_docker(mut self, docker: impl Into<String>) -> Self {
        self.docker = docker.into();
        self
    }

    /// Makes sure the image is available locally, pulling it if needed
    ///
    /// # Errors
    ///
    /// Returns [`QcError::SkullStrip`] if docker cannot be run or the pull
    /// fails
    pub fn ensure_image(&self) -> Result<()> {
        let output = self.docker_command(&["images", "-q", &self.image])?;
        if output.status.success() && !String::from_utf8_lossy(&output.stdout).trim().is_empty() {
            debug!("Docker image {} present", self.image);
            return Ok(());
        }

        info!("Docker image {} not found locally, pulling", self.image);
        let output =
            self.docker_command(&["pull", "--platform", &self.platform, &self.image])?;
        if !output.status.success() {
            return Err(QcError::SkullStrip(format!(
                "failed to pull {}: {}",
                self.image,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        info!("Pulled docker image {}", self.image);
        Ok(())
    }

    /// Arguments of the `docker run` invocation that strips `input` into `output`
    pub fn run_args(&self, input: &Path, output: &Path) -> Result<Vec<String>> {
        let input = input.canonicalize()?;
        let parent = input
            .parent()
            .ok_or_else(|| QcError::SkullStrip(format!("{} has no parent", input.display())))?;
        let in_name = file_name_of(&input)?;
        let out_name = file_name_of(output)?;

        Ok(vec![
            "run".to_string(),
            "--rm".to_string(),
            "--platform".to_string(),
            self.platform.clone(),
            "-v".to_string(),
            format!("{}:/data", parent.display()),
            self.image.clone(),
            "-i".to_string(),
            format!("/data/{}", in_name),
            "-o".to_string(),
            format!("/data/{}", out_name),
        ])
    }

    fn docker_command(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.docker)
            .args(args)
            .output()
            .map_err(|e| QcError::SkullStrip(format!("cannot run {}: {}", self.docker, e)))
    }
}

impl SkullStripper for SynthStrip {
    fn strip(&self, input: &Path, output: &Path) -> Result<()> {
        self.ensure_image()?;

        let args = self.run_args(input, output)?;
        info!("Running SynthStrip on {}", input.display());
        let status = Command::new(&self.docker)
            .args(&args)
            .status()
            .map_err(|e| QcError::SkullStrip(format!("cannot run {}: {}", self.docker, e)))?;

        if !status.success() {
            return Err(QcError::SkullStrip(format!(
                "SynthStrip exited with {} for {}",
                status,
                input.display()
            )));
        }
        if !output.exists() {
            return Err(QcError::SkullStrip(format!(
                "SynthStrip produced no output at {}",
                output.display()
            )));
        }
        Ok(())
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| QcError::SkullStrip(format!("{} has no file name", path.display())))
}
