//! Slug allocation over the availability check
//!
//! The check never reserves anything, so a slug handed out here can still be
//! taken by another session before it is written. Callers treat a slug
//! conflict at commit time as a signal to call [`SlugAllocator::allocate_after`].

use shared::slug::{SlugStatus, SlugStyle, slugify};

use crate::backend::SlugRegistry;
use crate::error::PersistError;
use crate::validation::MAX_SLUG_LEN;

/// Derives unused slugs by probing `base`, `base1`, `base2`, ...
pub struct SlugAllocator<'a, R: SlugRegistry + ?Sized> {
    registry: &'a R,
    style: SlugStyle,
}

impl<'a, R: SlugRegistry + ?Sized> SlugAllocator<'a, R> {
    pub fn new(registry: &'a R, style: SlugStyle) -> Self {
        Self { registry, style }
    }

    pub fn style(&self) -> SlugStyle {
        self.style
    }

    /// Base slug for `name`, cut to the slug length limit
    pub fn normalize(&self, name: &str) -> String {
        fit(&slugify(name, self.style), MAX_SLUG_LEN).to_string()
    }

    /// Availability of `candidate` after normalization; reserves nothing
    pub async fn check(&self, candidate: &str, user_id: &str) -> Result<SlugStatus, PersistError> {
        let candidate = self.normalize(candidate);
        let availability = self
            .registry
            .check_slug_availability(&candidate, user_id)
            .await?;
        Ok(availability.status())
    }

    /// First unused slug for `name`
    pub async fn allocate(&self, name: &str, user_id: &str) -> Result<String, PersistError> {
        let base = self.normalize(name);
        self.probe(&base, user_id, 0).await
    }

    /// Re-probe after `conflicted` was rejected at write time
    ///
    /// Probing resumes at the suffix following the conflicted one, so a lost
    /// race costs one extra round-trip instead of a full rescan.
    pub async fn allocate_after(
        &self,
        name: &str,
        user_id: &str,
        conflicted: &str,
    ) -> Result<String, PersistError> {
        let base = self.normalize(name);
        let start = suffix_of(&base, conflicted).map_or(0, |n| n + 1);
        self.probe(&base, user_id, start).await
    }

    async fn probe(&self, base: &str, user_id: &str, start: u64) -> Result<String, PersistError> {
        let mut suffix = start;
        loop {
            let candidate = candidate(base, suffix);
            let availability = self
                .registry
                .check_slug_availability(&candidate, user_id)
                .await?;
            if !availability.exists {
                tracing::debug!(base, slug = %candidate, probes = suffix - start + 1, "Slug allocated");
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}

/// Longest prefix of `base` within `max_len`, without a dangling hyphen
fn fit(base: &str, max_len: usize) -> &str {
    match base.char_indices().nth(max_len) {
        Some((cut, _)) => base[..cut].trim_end_matches('-'),
        None => base,
    }
}

/// `base` with `suffix` appended, shortening `base` so the whole slug fits
fn candidate(base: &str, suffix: u64) -> String {
    if suffix == 0 {
        return fit(base, MAX_SLUG_LEN).to_string();
    }
    let suffix = suffix.to_string();
    let head = fit(base, MAX_SLUG_LEN.saturating_sub(suffix.len()));
    format!("{head}{suffix}")
}

/// Probe index of `slug` relative to `base` (`base` is 0, `base7` is 7)
fn suffix_of(base: &str, slug: &str) -> Option<u64> {
    if slug == candidate(base, 0) {
        return Some(0);
    }
    let digits = slug.len() - slug.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    (1..=digits).find_map(|len| {
        let tail = &slug[slug.len() - len..];
        if tail.starts_with('0') {
            return None;
        }
        let n: u64 = tail.parse().ok()?;
        (candidate(base, n) == slug).then_some(n)
    })
}
