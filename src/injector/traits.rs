use crate::injector::inject_code::InjectionReport;
use crate::injector::transform::AssetReference;
use anyhow::Error;
use std::path::Path;

/// Strategy that turns an asset path into the text injected for it.
pub trait Transform {
    /// Renders the reference for `path`.
    ///
    /// # Arguments
    /// * `path`: The prepared asset path (forward slashes, root slash policy applied).
    /// * `index`: Position of the asset in the asset list.
    /// * `total`: Number of assets in the list.
    ///
    /// # Returns
    /// `None` when the strategy has nothing to inject for this path.
    fn transform(&self, path: &str, index: usize, total: usize) -> Option<String>;
}

/// Trait for the 'inject' operation.
pub trait InjectOperation {
    /// Reads `source`, rewrites every marker region with `references` and writes
    /// the result to `destination` when it differs from what is already there.
    ///
    /// # Returns
    /// A report describing what happened to the file, or an `anyhow::Error` when
    /// the source cannot be read or the destination cannot be written.
    fn inject(
        &self,
        source: &Path,
        destination: &Path,
        references: &[AssetReference],
    ) -> Result<InjectionReport, Error>;
}
