//! Promotion Workflow
//!
//! Flips version statuses to promote a vetted candidate into the baseline
//! slot, enforcing the single-baseline invariant. Each metadata file is
//! replaced atomically, but the two status flips are intentionally not
//! transactional with each other; a crash between them leaves state an
//! operator must reconcile by hand.

use crate::model::{VersionStatus, load_version_metadata, save_version_metadata};
use crate::scaffold::version_metadata_files;
use crate::{StoreError, utc_now};
use std::path::Path;
use tracing::info;

/// Promote `candidate_slug` to baseline, archiving the current baseline.
///
/// Preconditions, checked in order: the candidate's metadata file exists,
/// its status is exactly `candidate`, and exactly one version currently has
/// `baseline` status. On success the old baseline becomes
/// `archived-baseline` with an `archived_at` stamp and the candidate becomes
/// `baseline` with `promoted_by_campaign` and `promoted_at` set.
pub fn promote_candidate_to_baseline(
    root: &Path,
    candidate_slug: &str,
    campaign_id: &str,
) -> Result<(), StoreError> {
    let versions_dir = root.join("versions");
    let candidate_file = versions_dir.join(candidate_slug).join("version.yaml");
    if !candidate_file.is_file() {
        return Err(StoreError::CandidateNotFound(candidate_slug.to_string()));
    }

    let mut candidate = load_version_metadata(&candidate_file)?;
    if candidate.status != VersionStatus::Candidate {
        return Err(StoreError::NotACandidate(candidate_slug.to_string()));
    }

    let mut baseline_files = Vec::new();
    for metadata_path in version_metadata_files(&versions_dir)? {
        let metadata = load_version_metadata(&metadata_path)?;
        if metadata.status == VersionStatus::Baseline {
            baseline_files.push((metadata_path, metadata));
        }
    }
    let (baseline_file, mut baseline) = match baseline_files.len() {
        0 => return Err(StoreError::NoBaseline),
        1 => baseline_files.remove(0),
        _ => {
            let mut slugs: Vec<String> =
                baseline_files.into_iter().map(|(_, m)| m.slug).collect();
            slugs.sort();
            return Err(StoreError::MultipleBaselines(slugs));
        }
    };

    let now = utc_now();

    baseline.status = VersionStatus::ArchivedBaseline;
    baseline.archived_at = Some(now.clone());
    save_version_metadata(&baseline_file, &baseline)?;

    candidate.status = VersionStatus::Baseline;
    candidate.promoted_by_campaign = Some(campaign_id.to_string());
    candidate.promoted_at = Some(now);
    save_version_metadata(&candidate_file, &candidate)?;

    info!(
        candidate = candidate_slug,
        archived = %baseline.slug,
        campaign = campaign_id,
        "promoted candidate to baseline"
    );
    Ok(())
}
