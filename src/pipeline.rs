use crate::archive::{UnpackReport, Unpacker};
use crate::config::ResolvedConfig;
use crate::console::{Console, bytes_to_human};
use crate::error::SetupError;
use crate::fs_util;
use crate::generator::GeneratorClient;
use crate::transfer::{TransferClient, TransferReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Extract,
    Generate,
    Clean,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Download, Stage::Extract, Stage::Generate, Stage::Clean];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Download => "Downloading Dependencies",
            Stage::Extract => "Extracting Dependencies",
            Stage::Generate => "Generating Project Files",
            Stage::Clean => "Cleaning Up",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Download => 0,
            Stage::Extract => 1,
            Stage::Generate => 2,
            Stage::Clean => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Passed,
    Failed,
    /// Failure reported but never fatal (cleanup only).
    Advisory,
}

#[derive(Debug)]
pub struct PipelineState {
    current: usize,
    total: usize,
    outcomes: Vec<(Stage, StageStatus)>,
}

impl PipelineState {
    fn new(total: usize) -> Self {
        Self {
            current: 0,
            total,
            outcomes: Vec::new(),
        }
    }

    // stage ordinals only ever move forward
    fn begin(&mut self, stage: Stage) -> (usize, usize) {
        debug_assert!(stage.index() + 1 > self.current);
        self.current = stage.index() + 1;
        (self.current, self.total)
    }

    fn record(&mut self, stage: Stage, status: StageStatus) {
        self.outcomes.push((stage, status));
    }

    pub fn current_stage(&self) -> usize {
        self.current
    }

    pub fn total_stages(&self) -> usize {
        self.total
    }

    pub fn outcomes(&self) -> &[(Stage, StageStatus)] {
        &self.outcomes
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub cleanup_warning: Option<String>,
}

pub struct Pipeline<T: TransferClient, G: GeneratorClient> {
    config: ResolvedConfig,
    console: Console,
    transfer: T,
    generator: G,
}

impl<T: TransferClient, G: GeneratorClient> Pipeline<T, G> {
    pub fn new(config: ResolvedConfig, console: Console, transfer: T, generator: G) -> Self {
        Self {
            config,
            console,
            transfer,
            generator,
        }
    }

    /// Runs the four stages in order. The first failing stage aborts the
    /// pipeline; nothing done by earlier stages is rolled back. Cleanup is
    /// advisory and never changes the verdict.
    pub fn run(&self) -> Result<PipelineReport, SetupError> {
        let mut state = PipelineState::new(Stage::ALL.len());

        self.announce(&mut state, Stage::Download);
        if let Err(err) = self.download() {
            state.record(Stage::Download, StageStatus::Failed);
            self.console.error(&format!("Download failed: {err}"));
            return Err(err);
        }
        state.record(Stage::Download, StageStatus::Passed);

        self.announce(&mut state, Stage::Extract);
        if let Err(err) = self.extract() {
            state.record(Stage::Extract, StageStatus::Failed);
            self.console.error(&format!("Extraction failed: {err}"));
            return Err(err);
        }
        state.record(Stage::Extract, StageStatus::Passed);

        self.announce(&mut state, Stage::Generate);
        if let Err(err) = self.generate() {
            state.record(Stage::Generate, StageStatus::Failed);
            if let SetupError::GeneratorExit { stderr, .. } = &err {
                if !stderr.trim().is_empty() {
                    self.console.plain(stderr.trim_end());
                }
            }
            self.console.error("Project generation failed");
            // the transient archive is still dealt with before aborting
            self.announce(&mut state, Stage::Clean);
            self.clean(&mut state);
            return Err(err);
        }
        state.record(Stage::Generate, StageStatus::Passed);

        self.announce(&mut state, Stage::Clean);
        let cleanup_warning = self.clean(&mut state);

        self.console.blank();
        self.console.header("SETUP COMPLETE");
        self.console.success("The Prism engine is ready to use!");
        self.console.blank();
        self.console
            .info("You can now open the generated project files in your IDE.");
        self.console.plain("Happy coding!");

        Ok(PipelineReport {
            state,
            cleanup_warning,
        })
    }

    fn announce(&self, state: &mut PipelineState, stage: Stage) {
        let (current, total) = state.begin(stage);
        self.console.step(current, total, stage.label());
    }

    fn download(&self) -> Result<TransferReport, SetupError> {
        self.console.info("Connecting to the release server...");
        let stream = self.transfer.open(&self.config.bundle_url)?;
        self.console.success("Connection established");
        if stream.total_bytes() > 0 {
            self.console
                .info(&format!("File size: {}", bytes_to_human(stream.total_bytes())));
        } else {
            self.console.info("File size: unknown");
        }
        self.console.blank();

        let report = stream.stream_to(self.config.archive_file.as_std_path(), &self.console)?;

        self.console.blank();
        self.console
            .success(&format!("Download complete: {}", self.config.archive_file));
        Ok(report)
    }

    fn extract(&self) -> Result<UnpackReport, SetupError> {
        self.console.info("Opening archive...");
        let unpacker = Unpacker::new(
            self.config.archive_file.as_std_path(),
            self.config.extract_to.as_std_path(),
        );
        let opened = unpacker.open()?;
        self.console.success("Archive opened successfully");
        self.console
            .info(&format!("Files to extract: {}", opened.entry_count()));
        self.console.blank();

        fs_util::ensure_dir(self.config.extract_to.as_std_path())?;
        let report = opened.extract(&self.console)?;

        self.console.blank();
        self.console.success(&format!(
            "Extraction complete: {} files",
            report.entries_processed
        ));
        Ok(report)
    }

    fn generate(&self) -> Result<(), SetupError> {
        self.console.info("Generating project files...");
        self.console.blank();

        let output = self
            .generator
            .generate(self.config.generator_script.as_std_path())?;
        if !output.stdout.trim().is_empty() {
            self.console.plain(output.stdout.trim_end());
        }
        self.console.success("Project generation complete");
        Ok(())
    }

    fn clean(&self, state: &mut PipelineState) -> Option<String> {
        if self.config.keep_archive {
            self.console
                .info(&format!("Keeping archive: {}", self.config.archive_file));
            state.record(Stage::Clean, StageStatus::Passed);
            return None;
        }
        match fs_util::remove_file_if_exists(self.config.archive_file.as_std_path()) {
            Ok(true) => {
                self.console
                    .success(&format!("Cleaned up: {}", self.config.archive_file));
                state.record(Stage::Clean, StageStatus::Passed);
                None
            }
            Ok(false) => {
                state.record(Stage::Clean, StageStatus::Passed);
                None
            }
            Err(err) => {
                let message = format!("Could not remove {}: {err}", self.config.archive_file);
                self.console.warning(&message);
                state.record(Stage::Clean, StageStatus::Advisory);
                Some(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ordinals_cover_the_pipeline() {
        let labels: Vec<_> = Stage::ALL.iter().map(|stage| stage.label()).collect();
        assert_eq!(labels.len(), 4);
        assert_eq!(Stage::Download.index(), 0);
        assert_eq!(Stage::Clean.index(), 3);
    }

    #[test]
    fn state_advances_forward_only() {
        let mut state = PipelineState::new(4);
        assert_eq!(state.begin(Stage::Download), (1, 4));
        assert_eq!(state.begin(Stage::Extract), (2, 4));
        assert_eq!(state.begin(Stage::Generate), (3, 4));
        assert_eq!(state.begin(Stage::Clean), (4, 4));
        assert_eq!(state.current_stage(), 4);
    }
}
