//! Slice table resource.
//!
//! A scene's timeline is cut into [`Slice`]s: contiguous frame ranges with
//! their own pass threshold, retry budgets and transition targets. The table
//! is deserialized from the scene manifest once at scene load and never
//! mutated afterwards.
//!
//! A [`SliceTable`] can only be built through [`SliceTable::new`], which
//! validates every frame range and transition target. Playback code may
//! therefore index the table directly: a bad index is a configuration error
//! caught at load time, never at runtime.

use std::fmt;
use std::ops::Index;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One playback segment of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    /// Progress key written when the slice is completed.
    #[serde(default)]
    pub name: String,
    /// First frame of the slice (inclusive).
    pub first_frame: u32,
    /// Last frame of the slice (inclusive).
    pub last_frame: u32,
    /// Touched ticks required to pass. `0` passes unconditionally.
    #[serde(default)]
    pub pass_threshold: u32,
    /// Automatic replays allowed before falling back to `fail_slice`.
    #[serde(default)]
    pub loop_chances: u32,
    /// Tolerated early releases before falling back to `fail_slice`.
    #[serde(default)]
    pub release_chances: u32,
    /// Slice chosen on pass, one entry per hotspot region.
    #[serde(default)]
    pub next_slice: Vec<usize>,
    /// Slice chosen once a chance budget is exhausted.
    #[serde(default)]
    pub fail_slice: usize,
    #[serde(default)]
    pub is_last_slice: bool,
    #[serde(default)]
    pub loop_on_release: bool,
    #[serde(default)]
    pub pass_on_release: bool,
    /// Whether score indicators are updated while this slice plays.
    #[serde(default = "default_true")]
    pub show_score: bool,
    #[serde(default)]
    pub fades_with_chances: bool,
}

impl Slice {
    /// Create an auto-passing slice covering `first_frame..=last_frame`.
    pub fn new(name: impl Into<String>, first_frame: u32, last_frame: u32) -> Self {
        Self {
            name: name.into(),
            first_frame,
            last_frame,
            pass_threshold: 0,
            loop_chances: 0,
            release_chances: 0,
            next_slice: Vec::new(),
            fail_slice: 0,
            is_last_slice: false,
            loop_on_release: false,
            pass_on_release: false,
            show_score: true,
            fades_with_chances: false,
        }
    }

    /// Number of frames in the slice.
    pub fn frame_count(&self) -> u32 {
        self.last_frame.saturating_sub(self.first_frame) + 1
    }

    /// Whether `frame` lies inside this slice.
    pub fn contains_frame(&self, frame: u32) -> bool {
        (self.first_frame..=self.last_frame).contains(&frame)
    }
}

/// Configuration defects detected while building a [`SliceTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceTableError {
    Empty,
    InvertedRange {
        slice: usize,
        first_frame: u32,
        last_frame: u32,
    },
    FrameOutOfRange {
        slice: usize,
        last_frame: u32,
        frame_count: usize,
    },
    NextSliceCount {
        slice: usize,
        expected: usize,
        found: usize,
    },
    TargetOutOfRange {
        slice: usize,
        target: usize,
        slice_count: usize,
    },
    StartOutOfRange {
        start: usize,
        slice_count: usize,
    },
    /// Non-terminal slice in a scene without hotspot regions.
    NoRegions { slice: usize },
}

impl fmt::Display for SliceTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceTableError::Empty => write!(f, "slice table is empty"),
            SliceTableError::InvertedRange {
                slice,
                first_frame,
                last_frame,
            } => write!(
                f,
                "slice {}: first_frame {} is after last_frame {}",
                slice, first_frame, last_frame
            ),
            SliceTableError::FrameOutOfRange {
                slice,
                last_frame,
                frame_count,
            } => write!(
                f,
                "slice {}: last_frame {} is past the {} loaded frames",
                slice, last_frame, frame_count
            ),
            SliceTableError::NextSliceCount {
                slice,
                expected,
                found,
            } => write!(
                f,
                "slice {}: {} next_slice entries for {} hotspot regions",
                slice, found, expected
            ),
            SliceTableError::TargetOutOfRange {
                slice,
                target,
                slice_count,
            } => write!(
                f,
                "slice {}: transition target {} is out of range (0..{})",
                slice, target, slice_count
            ),
            SliceTableError::StartOutOfRange { start, slice_count } => write!(
                f,
                "start slice {} is out of range (0..{})",
                start, slice_count
            ),
            SliceTableError::NoRegions { slice } => write!(
                f,
                "slice {}: not terminal, but the scene has no hotspot regions to leave it by",
                slice
            ),
        }
    }
}

impl std::error::Error for SliceTableError {}

/// Validated, immutable table of slices for the active scene.
#[derive(Resource, Debug, Clone)]
pub struct SliceTable {
    slices: Vec<Slice>,
    region_count: usize,
}

impl SliceTable {
    /// Validate `slices` against the loaded frame count and hotspot regions.
    ///
    /// Every non-terminal slice needs exactly one `next_slice` entry per
    /// region, and therefore at least one region. Terminal slices never
    /// transition, so their targets are not checked.
    pub fn new(
        slices: Vec<Slice>,
        region_count: usize,
        frame_count: usize,
    ) -> Result<Self, SliceTableError> {
        if slices.is_empty() {
            return Err(SliceTableError::Empty);
        }
        let slice_count = slices.len();
        for (index, slice) in slices.iter().enumerate() {
            if slice.first_frame > slice.last_frame {
                return Err(SliceTableError::InvertedRange {
                    slice: index,
                    first_frame: slice.first_frame,
                    last_frame: slice.last_frame,
                });
            }
            if slice.last_frame as usize >= frame_count {
                return Err(SliceTableError::FrameOutOfRange {
                    slice: index,
                    last_frame: slice.last_frame,
                    frame_count,
                });
            }
            if slice.is_last_slice {
                continue;
            }
            if region_count == 0 {
                return Err(SliceTableError::NoRegions { slice: index });
            }
            if slice.next_slice.len() != region_count {
                return Err(SliceTableError::NextSliceCount {
                    slice: index,
                    expected: region_count,
                    found: slice.next_slice.len(),
                });
            }
            let targets = slice.next_slice.iter().chain(Some(&slice.fail_slice));
            for &target in targets {
                if target >= slice_count {
                    return Err(SliceTableError::TargetOutOfRange {
                        slice: index,
                        target,
                        slice_count,
                    });
                }
            }
        }
        Ok(Self {
            slices,
            region_count,
        })
    }

    /// Check that playback may start at `start`.
    pub fn check_start(&self, start: usize) -> Result<(), SliceTableError> {
        if start >= self.slices.len() {
            return Err(SliceTableError::StartOutOfRange {
                start,
                slice_count: self.slices.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn region_count(&self) -> usize {
        self.region_count
    }

    pub fn get(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slice> {
        self.slices.iter()
    }
}

impl Index<usize> for SliceTable {
    type Output = Slice;

    fn index(&self, index: usize) -> &Slice {
        &self.slices[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chained(count: usize) -> Vec<Slice> {
        (0..count)
            .map(|i| {
                let mut s = Slice::new(format!("Scene_Slice {}", i), i as u32 * 10, i as u32 * 10 + 9);
                if i + 1 == count {
                    s.is_last_slice = true;
                } else {
                    s.next_slice = vec![i + 1];
                    s.fail_slice = i;
                }
                s
            })
            .collect()
    }

    #[test]
    fn test_valid_chain_builds() {
        let table = SliceTable::new(chained(3), 1, 30).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.region_count(), 1);
        assert_eq!(table[2].first_frame, 20);
        assert!(table.check_start(2).is_ok());
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert_eq!(SliceTable::new(Vec::new(), 1, 10).unwrap_err(), SliceTableError::Empty);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let mut slices = chained(2);
        slices[0].first_frame = 9;
        slices[0].last_frame = 3;
        assert!(matches!(
            SliceTable::new(slices, 1, 20),
            Err(SliceTableError::InvertedRange { slice: 0, .. })
        ));
    }

    #[test]
    fn test_frame_past_loaded_frames_is_rejected() {
        assert!(matches!(
            SliceTable::new(chained(2), 1, 15),
            Err(SliceTableError::FrameOutOfRange { slice: 1, last_frame: 19, .. })
        ));
    }

    #[test]
    fn test_next_slice_count_must_match_regions() {
        assert!(matches!(
            SliceTable::new(chained(2), 2, 20),
            Err(SliceTableError::NextSliceCount { slice: 0, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_out_of_range_fail_slice_is_rejected() {
        let mut slices = chained(2);
        slices[0].fail_slice = 7;
        assert_eq!(
            SliceTable::new(slices, 1, 20).unwrap_err(),
            SliceTableError::TargetOutOfRange {
                slice: 0,
                target: 7,
                slice_count: 2
            }
        );
    }

    #[test]
    fn test_terminal_slice_targets_are_not_checked() {
        let mut slices = chained(2);
        slices[1].next_slice = vec![42, 43];
        slices[1].fail_slice = 99;
        assert!(SliceTable::new(slices, 1, 20).is_ok());
    }

    #[test]
    fn test_scene_without_regions_needs_terminal_slices() {
        let mut slices = chained(3);
        for slice in slices.iter_mut() {
            slice.next_slice.clear();
        }
        assert_eq!(
            SliceTable::new(slices, 0, 30).unwrap_err(),
            SliceTableError::NoRegions { slice: 0 }
        );

        let single = chained(1);
        assert!(SliceTable::new(single, 0, 10).is_ok());
    }

    #[test]
    fn test_start_out_of_range() {
        let table = SliceTable::new(chained(2), 1, 20).unwrap();
        assert!(matches!(
            table.check_start(2),
            Err(SliceTableError::StartOutOfRange { start: 2, slice_count: 2 })
        ));
    }

    #[test]
    fn test_slice_defaults_from_json() {
        let slice: Slice =
            serde_json::from_str(r#"{ "first_frame": 4, "last_frame": 8 }"#).unwrap();
        assert_eq!(slice.pass_threshold, 0);
        assert!(slice.show_score);
        assert!(!slice.fades_with_chances);
        assert_eq!(slice.frame_count(), 5);
        assert!(slice.contains_frame(8));
        assert!(!slice.contains_frame(9));
    }
}
