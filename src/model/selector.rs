//! Pure format selection: given a catalog, decide what to download.
//!
//! No I/O happens here. The selector either picks a single progressive
//! stream (no merge needed) or pairs the best video-only stream with the
//! best audio-only stream for the muxer.

use crate::error::{Error, Result};
use crate::model::{Catalog, StreamDescriptor, StreamKind};

/// The resolution tier the pipeline aims for.
pub const TARGET_HEIGHT: u32 = 720;

/// How strict the selection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Primary rule: a combined stream only counts when it matches the
    /// target tier exactly and is MP4-like; otherwise pair adaptive streams.
    Strict,
    /// Secondary rule, used against the fallback provider: accept the first
    /// combined MP4 stream at or below the target tier when no exact match
    /// exists, and any combined MP4 stream after that. Relaxes the quality
    /// tier but never the container, so the output stays a playable MP4.
    Relaxed,
}

/// What the fetch stage should download.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPlan {
    /// One progressive stream, playable without a merge.
    Combined(StreamDescriptor),
    /// Separate adaptive streams, to be merged by the muxer.
    ///
    /// Never holds a stream of kind [`StreamKind::Combined`].
    Paired {
        video: StreamDescriptor,
        audio: StreamDescriptor,
    },
}

/// Picks a download plan from the catalog.
///
/// # Errors
///
/// Returns [`Error::NoSuitableFormat`] when neither a usable combined stream
/// nor a complete video/audio pair exists.
pub fn select(
    catalog: &Catalog,
    policy: SelectionPolicy,
    target_height: u32,
) -> Result<SelectionPlan> {
    if let Some(combined) = select_combined(catalog, policy, target_height) {
        return Ok(SelectionPlan::Combined(combined.clone()));
    }

    select_paired(catalog)
}

fn select_combined<'a>(
    catalog: &'a Catalog,
    policy: SelectionPolicy,
    target_height: u32,
) -> Option<&'a StreamDescriptor> {
    // The container constraint never relaxes: only the quality tier does.
    let combined_mp4 = || {
        catalog
            .streams
            .iter()
            .filter(|s| s.kind == StreamKind::Combined && s.is_mp4())
    };

    let exact = combined_mp4().find(|s| s.height == Some(target_height));

    match policy {
        SelectionPolicy::Strict => exact,
        SelectionPolicy::Relaxed => exact
            .or_else(|| combined_mp4().find(|s| s.height.is_some_and(|h| h <= target_height)))
            .or_else(|| combined_mp4().next()),
    }
}

fn select_paired(catalog: &Catalog) -> Result<SelectionPlan> {
    // Strict `>` folds keep the first-seen stream on ties.
    let video = catalog
        .streams
        .iter()
        .filter(|s| s.kind == StreamKind::VideoOnly)
        .fold(None::<&StreamDescriptor>, |best, candidate| match best {
            Some(current) if candidate.height.unwrap_or(0) > current.height.unwrap_or(0) => {
                Some(candidate)
            }
            Some(current) => Some(current),
            None => Some(candidate),
        })
        .ok_or_else(|| Error::NoSuitableFormat("no video-only stream in catalog".to_string()))?;

    let audio = catalog
        .streams
        .iter()
        .filter(|s| s.kind == StreamKind::AudioOnly)
        .fold(None::<&StreamDescriptor>, |best, candidate| match best {
            Some(current) if candidate.bitrate.unwrap_or(0) > current.bitrate.unwrap_or(0) => {
                Some(candidate)
            }
            Some(current) => Some(current),
            None => Some(candidate),
        })
        .ok_or_else(|| Error::NoSuitableFormat("no audio-only stream in catalog".to_string()))?;

    debug_assert!(video.kind != StreamKind::Combined && audio.kind != StreamKind::Combined);

    Ok(SelectionPlan::Paired {
        video: video.clone(),
        audio: audio.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stream(
        id: &str,
        kind: StreamKind,
        container: &str,
        height: Option<u32>,
        bitrate: Option<u64>,
    ) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            kind,
            container: container.to_string(),
            width: height.map(|h| h * 16 / 9),
            height,
            bitrate,
            quality_label: height
                .map(|h| format!("{h}p"))
                .unwrap_or_else(|| "audio".to_string()),
            url: format!("https://streams.example/{id}"),
        }
    }

    fn make_catalog(streams: Vec<StreamDescriptor>) -> Catalog {
        Catalog {
            reference: "dQw4w9WgXcQ".to_string(),
            title: "test".to_string(),
            duration_seconds: 212,
            streams,
        }
    }

    #[test]
    fn strict_picks_combined_720p_mp4() {
        let target = make_stream("22", StreamKind::Combined, "MPEG_4", Some(720), None);
        let catalog = make_catalog(vec![
            make_stream("18", StreamKind::Combined, "MPEG_4", Some(360), None),
            target.clone(),
        ]);

        let plan = select(&catalog, SelectionPolicy::Strict, TARGET_HEIGHT).unwrap();
        assert_eq!(plan, SelectionPlan::Combined(target));
    }

    #[test]
    fn strict_ignores_combined_720p_webm() {
        let catalog = make_catalog(vec![
            make_stream("247", StreamKind::Combined, "WEBM", Some(720), None),
            make_stream("137", StreamKind::VideoOnly, "MPEG_4", Some(1080), None),
            make_stream("140", StreamKind::AudioOnly, "M4A", None, Some(128_000)),
        ]);

        let plan = select(&catalog, SelectionPolicy::Strict, TARGET_HEIGHT).unwrap();
        assert!(matches!(plan, SelectionPlan::Paired { .. }));
    }

    #[test]
    fn paired_takes_max_height_and_max_bitrate() {
        let catalog = make_catalog(vec![
            make_stream("134", StreamKind::VideoOnly, "MPEG_4", Some(360), None),
            make_stream("137", StreamKind::VideoOnly, "MPEG_4", Some(1080), None),
            make_stream("136", StreamKind::VideoOnly, "MPEG_4", Some(720), None),
            make_stream("139", StreamKind::AudioOnly, "M4A", None, Some(48_000)),
            make_stream("140", StreamKind::AudioOnly, "M4A", None, Some(128_000)),
        ]);

        match select(&catalog, SelectionPolicy::Strict, TARGET_HEIGHT).unwrap() {
            SelectionPlan::Paired { video, audio } => {
                assert_eq!(video.id, "137");
                assert_eq!(audio.id, "140");
            }
            plan => panic!("expected paired plan, got {plan:?}"),
        }
    }

    #[test]
    fn paired_tie_break_is_first_seen() {
        let catalog = make_catalog(vec![
            make_stream("v-first", StreamKind::VideoOnly, "MPEG_4", Some(1080), None),
            make_stream("v-second", StreamKind::VideoOnly, "WEBM", Some(1080), None),
            make_stream("a-first", StreamKind::AudioOnly, "M4A", None, Some(128_000)),
            make_stream("a-second", StreamKind::AudioOnly, "WEBM", None, Some(128_000)),
        ]);

        match select(&catalog, SelectionPolicy::Strict, TARGET_HEIGHT).unwrap() {
            SelectionPlan::Paired { video, audio } => {
                assert_eq!(video.id, "v-first");
                assert_eq!(audio.id, "a-first");
            }
            plan => panic!("expected paired plan, got {plan:?}"),
        }
    }

    #[test]
    fn missing_audio_is_no_suitable_format() {
        let catalog = make_catalog(vec![
            make_stream("137", StreamKind::VideoOnly, "MPEG_4", Some(1080), None),
        ]);

        let result = select(&catalog, SelectionPolicy::Strict, TARGET_HEIGHT);
        assert!(matches!(result, Err(Error::NoSuitableFormat(_))));
    }

    #[test]
    fn missing_video_is_no_suitable_format() {
        let catalog = make_catalog(vec![
            make_stream("140", StreamKind::AudioOnly, "M4A", None, Some(128_000)),
        ]);

        let result = select(&catalog, SelectionPolicy::Strict, TARGET_HEIGHT);
        assert!(matches!(result, Err(Error::NoSuitableFormat(_))));
    }

    #[test]
    fn relaxed_accepts_first_combined_at_or_below_tier() {
        let catalog = make_catalog(vec![
            make_stream("hi", StreamKind::Combined, "MPEG_4", Some(1080), None),
            make_stream("mid", StreamKind::Combined, "MPEG_4", Some(480), None),
            make_stream("low", StreamKind::Combined, "MPEG_4", Some(360), None),
        ]);

        match select(&catalog, SelectionPolicy::Relaxed, TARGET_HEIGHT).unwrap() {
            SelectionPlan::Combined(stream) => assert_eq!(stream.id, "mid"),
            plan => panic!("expected combined plan, got {plan:?}"),
        }
    }

    #[test]
    fn relaxed_still_prefers_exact_tier_match() {
        let catalog = make_catalog(vec![
            make_stream("low", StreamKind::Combined, "MPEG_4", Some(360), None),
            make_stream("exact", StreamKind::Combined, "MPEG_4", Some(720), None),
        ]);

        match select(&catalog, SelectionPolicy::Relaxed, TARGET_HEIGHT).unwrap() {
            SelectionPlan::Combined(stream) => assert_eq!(stream.id, "exact"),
            plan => panic!("expected combined plan, got {plan:?}"),
        }
    }

    #[test]
    fn relaxed_falls_back_to_any_combined_mp4_stream() {
        let catalog = make_catalog(vec![make_stream(
            "only",
            StreamKind::Combined,
            "MPEG_4",
            Some(1080),
            None,
        )]);

        match select(&catalog, SelectionPolicy::Relaxed, TARGET_HEIGHT).unwrap() {
            SelectionPlan::Combined(stream) => assert_eq!(stream.id, "only"),
            plan => panic!("expected combined plan, got {plan:?}"),
        }
    }

    #[test]
    fn relaxed_never_picks_a_non_mp4_combined_stream() {
        let catalog = make_catalog(vec![
            make_stream("webm-combined", StreamKind::Combined, "WEBM", Some(480), None),
            make_stream("137", StreamKind::VideoOnly, "MPEG_4", Some(1080), None),
            make_stream("140", StreamKind::AudioOnly, "M4A", None, Some(128_000)),
        ]);

        match select(&catalog, SelectionPolicy::Relaxed, TARGET_HEIGHT).unwrap() {
            SelectionPlan::Paired { video, audio } => {
                assert_eq!(video.id, "137");
                assert_eq!(audio.id, "140");
            }
            plan => panic!("expected paired plan, got {plan:?}"),
        }
    }

    #[test]
    fn relaxed_with_only_non_mp4_combined_and_no_pair_is_no_suitable_format() {
        let catalog = make_catalog(vec![make_stream(
            "webm-combined",
            StreamKind::Combined,
            "WEBM",
            Some(720),
            None,
        )]);

        let result = select(&catalog, SelectionPolicy::Relaxed, TARGET_HEIGHT);
        assert!(matches!(result, Err(Error::NoSuitableFormat(_))));
    }

    #[test]
    fn empty_catalog_is_no_suitable_format() {
        let catalog = make_catalog(Vec::new());
        for policy in [SelectionPolicy::Strict, SelectionPolicy::Relaxed] {
            let result = select(&catalog, policy, TARGET_HEIGHT);
            assert!(matches!(result, Err(Error::NoSuitableFormat(_))));
        }
    }
}
