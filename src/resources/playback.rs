//! Slice playback engine.
//!
//! [`Playback`] is the cursor of the active scene: which slice is playing,
//! which frame is shown, what is left of the retry budgets and the state of
//! every hotspot region. [`Playback::tick`] advances it by exactly one frame
//! and returns the side effects the host has to apply (audio seeks, progress
//! flags, scene exit) as [`PlaybackEffect`]s, so the engine itself never
//! touches audio, files or the ECS world.
//!
//! Per tick:
//! 1. the primary frame and every region's sprite and polygons are refreshed,
//! 2. the pointer is resolved to at most one region and each region registers
//!    its hit,
//! 3. early releases are evaluated (`loop_on_release` / `pass_on_release`),
//! 4. the frame advances, and past `last_frame` the slice is resolved.
//!
//! A transition triggered by an early release ends the tick: the new slice's
//! first frame is shown on the next tick.

use bevy_ecs::prelude::Resource;
use log::{debug, info, trace};
use raylib::prelude::Vector2;

use crate::components::tint::Tint;
use crate::resources::framestore::FrameStore;
use crate::resources::hotspot::{Hotspot, raycast};
use crate::resources::slicetable::{Slice, SliceTable};

/// Side effect requested by a playback tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEffect {
    /// Move the audio track to `seconds`.
    SeekAudio { seconds: f32 },
    /// Store the progress flag `name -> true`.
    SliceCompleted { name: String },
    /// A slice was (re)entered.
    SliceEntered { index: usize },
    /// The terminal slice ended; leave the scene.
    Finished,
}

#[derive(Resource, Debug, Clone)]
pub struct Playback {
    pub frame_rate: u32,
    pub current_frame: u32,
    pub current_slice: usize,
    pub loop_chances_to_use: u32,
    pub release_chances_to_use: u32,
    /// Tint applied to the primary frame.
    pub tint: Tint,
    /// Texture key of the primary frame shown by the last tick.
    pub primary_visual: Option<String>,
    pub hotspots: Vec<Hotspot>,
    pub finished: bool,
    effects: Vec<PlaybackEffect>,
}

impl Playback {
    /// Create a cursor positioned at `start`, with budgets loaded from it.
    ///
    /// `start` must have been checked with [`SliceTable::check_start`]. Call
    /// [`Playback::enter`] before the first tick to sync audio.
    pub fn new(slices: &SliceTable, start: usize, frame_rate: u32) -> Self {
        let slice = &slices[start];
        Self {
            frame_rate: frame_rate.max(1),
            current_frame: slice.first_frame,
            current_slice: start,
            loop_chances_to_use: slice.loop_chances,
            release_chances_to_use: slice.release_chances,
            tint: Tint::default(),
            primary_visual: None,
            hotspots: (0..slices.region_count()).map(Hotspot::new).collect(),
            finished: false,
            effects: Vec::new(),
        }
    }

    /// Enter the current slice from scratch and return the resulting effects.
    pub fn enter(&mut self, slices: &SliceTable) -> Vec<PlaybackEffect> {
        self.slice_entry_reset(slices);
        std::mem::take(&mut self.effects)
    }

    /// Seconds into the audio track matching the current frame.
    pub fn position_seconds(&self) -> f32 {
        self.current_frame as f32 / self.frame_rate as f32
    }

    /// Advance playback by one frame.
    pub fn tick(
        &mut self,
        slices: &SliceTable,
        frames: &FrameStore,
        pointer: Option<Vector2>,
    ) -> Vec<PlaybackEffect> {
        if self.finished {
            return Vec::new();
        }
        let index = self.current_slice;
        let slice = &slices[index];
        trace!("tick slice={} frame={}", index, self.current_frame);

        self.primary_visual = frames.primary_frame(self.current_frame).map(str::to_owned);

        if slice.loop_chances == 0 || self.loop_chances_to_use == slice.loop_chances {
            self.tint = Tint::default();
        }

        for hotspot in self.hotspots.iter_mut() {
            match frames.hotspot_frame(hotspot.region, self.current_frame) {
                Some(frame) => {
                    hotspot.update_frame(frame.tex_key.as_str());
                    hotspot.load_collider(&frame.polygons);
                }
                None => {
                    hotspot.remove_frame();
                    hotspot.remove_collider();
                }
            }
        }

        let struck = pointer.and_then(|p| raycast(&self.hotspots, p));
        for region in 0..self.hotspots.len() {
            if !self.hotspots[region].register_hit(slice, struck) {
                continue;
            }
            if slice.loop_on_release {
                self.release_chances_to_use = slice.release_chances;
                self.hotspots[region].hold_touch();
            } else if !slice.pass_on_release {
                self.tint = Tint::default();
            }
        }

        if slice.loop_on_release || slice.pass_on_release {
            for region in 0..self.hotspots.len() {
                if !self.hotspots[region].released() {
                    continue;
                }
                let transitioned = if slice.loop_on_release {
                    self.consume_release_chance(slices, slice)
                } else {
                    self.complete(slice);
                    self.transition_to(slices, slice.next_slice[region]);
                    self.slice_entry_reset(slices);
                    true
                };
                if transitioned {
                    return std::mem::take(&mut self.effects);
                }
            }
        }

        self.current_frame += 1;
        if self.current_frame > slice.last_frame {
            self.resolve_slice_end(slices, slice);
        }
        std::mem::take(&mut self.effects)
    }

    /// Reset the cursor to the first frame of the current slice.
    ///
    /// Seeks audio to that frame and clears every hotspot. Calling it twice
    /// leaves the cursor in the same state.
    pub fn slice_entry_reset(&mut self, slices: &SliceTable) {
        let slice = &slices[self.current_slice];
        self.current_frame = slice.first_frame;
        self.effects.push(PlaybackEffect::SeekAudio {
            seconds: self.position_seconds(),
        });
        for hotspot in self.hotspots.iter_mut() {
            hotspot.reset();
        }
        self.effects.push(PlaybackEffect::SliceEntered {
            index: self.current_slice,
        });
    }

    fn resolve_slice_end(&mut self, slices: &SliceTable, slice: &Slice) {
        if slice.is_last_slice {
            self.complete(slice);
            self.finished = true;
            info!("Last slice '{}' finished", slice.name);
            self.effects.push(PlaybackEffect::Finished);
            return;
        }

        let passed = self.hotspots.iter().position(|h| {
            slice.pass_threshold == 0
                || (h.touched_frames >= slice.pass_threshold && !slice.pass_on_release)
        });
        match passed {
            Some(region) => {
                debug!("Slice '{}' passed on region {}", slice.name, region);
                self.complete(slice);
                self.transition_to(slices, slice.next_slice[region]);
            }
            None if slice.loop_chances > 0 => self.consume_loop_chance(slices, slice),
            None => debug!("Slice '{}' replays", slice.name),
        }
        self.slice_entry_reset(slices);
    }

    fn consume_loop_chance(&mut self, slices: &SliceTable, slice: &Slice) {
        self.loop_chances_to_use = self.loop_chances_to_use.saturating_sub(1);
        debug!(
            "Slice '{}' loops, {} loop chances left",
            slice.name, self.loop_chances_to_use
        );
        if slice.fades_with_chances {
            self.tint = Tint::faded(self.loop_chances_to_use, slice.loop_chances);
        }
        if self.loop_chances_to_use == 0 {
            self.transition_to(slices, slice.fail_slice);
        }
    }

    /// Returns `true` when the budget ran out and playback fell back.
    fn consume_release_chance(&mut self, slices: &SliceTable, slice: &Slice) -> bool {
        if self.release_chances_to_use == 0 {
            self.transition_to(slices, slice.fail_slice);
            self.slice_entry_reset(slices);
            return true;
        }
        self.release_chances_to_use -= 1;
        debug!(
            "Slice '{}' released, {} release chances left",
            slice.name, self.release_chances_to_use
        );
        self.tint = Tint::faded(self.release_chances_to_use, slice.release_chances);
        false
    }

    fn complete(&mut self, slice: &Slice) {
        self.effects.push(PlaybackEffect::SliceCompleted {
            name: slice.name.clone(),
        });
    }

    fn transition_to(&mut self, slices: &SliceTable, index: usize) {
        let next = &slices[index];
        info!(
            "Slice transition {} -> {} ('{}')",
            self.current_slice, index, next.name
        );
        self.current_slice = index;
        self.loop_chances_to_use = next.loop_chances;
        self.release_chances_to_use = next.release_chances;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::framestore::HotspotFrame;
    use crate::resources::hotspot::Polygon;
    use rustc_hash::FxHashMap;

    const INSIDE: Vector2 = Vector2 { x: 5.0, y: 5.0 };

    fn square() -> Polygon {
        vec![
            Vector2 { x: 0.0, y: 0.0 },
            Vector2 { x: 10.0, y: 0.0 },
            Vector2 { x: 10.0, y: 10.0 },
            Vector2 { x: 0.0, y: 10.0 },
        ]
    }

    /// `frame_count` primary frames and one region shown on every frame.
    fn frames(frame_count: u32) -> FrameStore {
        let mut store = FrameStore::new((0..frame_count).map(|i| format!("frame_{}", i)).collect());
        let mut region = FxHashMap::default();
        for i in 0..frame_count {
            region.insert(
                i,
                HotspotFrame {
                    tex_key: format!("button0_{}", i),
                    polygons: vec![square()],
                },
            );
        }
        store.push_region(region);
        store
    }

    const INSIDE_SECOND: Vector2 = Vector2 { x: 25.0, y: 5.0 };

    /// Region 0 at `(0,0)..(10,10)` and region 1 at `(20,0)..(30,10)` on
    /// every frame.
    fn two_regions(frame_count: u32) -> FrameStore {
        let mut store = frames(frame_count);
        let mut region = FxHashMap::default();
        for i in 0..frame_count {
            let shifted = square().into_iter().map(|v| Vector2 { x: v.x + 20.0, y: v.y }).collect();
            region.insert(
                i,
                HotspotFrame {
                    tex_key: format!("button1_{}", i),
                    polygons: vec![shifted],
                },
            );
        }
        store.push_region(region);
        store
    }

    fn branching(first: u32, last: u32) -> Slice {
        let mut s = Slice::new("Scene_Slice 0", first, last);
        s.next_slice = vec![1, 2];
        s.fail_slice = 0;
        s
    }

    fn slice(index: usize, first: u32, last: u32) -> Slice {
        let mut s = Slice::new(format!("Scene_Slice {}", index), first, last);
        s.next_slice = vec![index + 1];
        s.fail_slice = index;
        s
    }

    fn last(index: usize, first: u32, last: u32) -> Slice {
        let mut s = Slice::new(format!("Scene_Slice {}", index), first, last);
        s.is_last_slice = true;
        s
    }

    fn run(
        playback: &mut Playback,
        table: &SliceTable,
        store: &FrameStore,
        ticks: usize,
        pointer: Option<Vector2>,
    ) -> Vec<PlaybackEffect> {
        let mut effects = Vec::new();
        for _ in 0..ticks {
            effects.extend(playback.tick(table, store, pointer));
        }
        effects
    }

    #[test]
    fn test_auto_pass_after_last_frame() {
        let table = SliceTable::new(vec![slice(0, 0, 23), last(1, 24, 47)], 1, 48).unwrap();
        let store = frames(48);
        let mut playback = Playback::new(&table, 0, 24);
        playback.enter(&table);

        let effects = run(&mut playback, &table, &store, 23, None);
        assert_eq!(playback.current_slice, 0);
        assert!(effects.is_empty());

        let effects = playback.tick(&table, &store, None);
        assert_eq!(playback.current_slice, 1);
        assert_eq!(playback.current_frame, 24);
        assert_eq!(
            effects,
            vec![
                PlaybackEffect::SliceCompleted {
                    name: "Scene_Slice 0".into()
                },
                PlaybackEffect::SeekAudio { seconds: 1.0 },
                PlaybackEffect::SliceEntered { index: 1 },
            ]
        );
    }

    #[test]
    fn test_enter_seeks_to_first_frame() {
        let table = SliceTable::new(vec![slice(0, 0, 23), last(1, 24, 47)], 1, 48).unwrap();
        let mut playback = Playback::new(&table, 1, 24);
        let effects = playback.enter(&table);
        assert_eq!(effects[0], PlaybackEffect::SeekAudio { seconds: 1.0 });
        assert_eq!(playback.current_frame, 24);
    }

    #[test]
    fn test_threshold_pass_takes_region_target() {
        let mut s0 = slice(0, 0, 4);
        s0.pass_threshold = 3;
        s0.next_slice = vec![2];
        let table =
            SliceTable::new(vec![s0, last(1, 5, 9), last(2, 10, 14)], 1, 15).unwrap();
        let store = frames(15);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 3, Some(INSIDE));
        run(&mut playback, &table, &store, 2, None);
        assert_eq!(playback.current_slice, 2);
        assert_eq!(playback.current_frame, 10);
    }

    #[test]
    fn test_failed_slice_without_loops_replays() {
        let mut s0 = slice(0, 0, 4);
        s0.pass_threshold = 3;
        let table = SliceTable::new(vec![s0, last(1, 5, 9)], 1, 10).unwrap();
        let store = frames(10);
        let mut playback = Playback::new(&table, 0, 24);

        let effects = run(&mut playback, &table, &store, 5, None);
        assert_eq!(playback.current_slice, 0);
        assert_eq!(playback.current_frame, 0);
        assert!(effects.contains(&PlaybackEffect::SeekAudio { seconds: 0.0 }));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, PlaybackEffect::SliceCompleted { .. })));
    }

    #[test]
    fn test_loop_budget_exhaustion_falls_back_and_reloads() {
        let mut s0 = slice(0, 0, 3);
        s0.loop_chances = 1;
        let mut s1 = slice(1, 4, 7);
        s1.pass_threshold = 3;
        s1.loop_chances = 2;
        s1.fail_slice = 0;
        let table = SliceTable::new(vec![s0, s1, last(2, 8, 9)], 1, 10).unwrap();
        let store = frames(10);
        let mut playback = Playback::new(&table, 1, 24);

        run(&mut playback, &table, &store, 4, None);
        assert_eq!(playback.current_slice, 1);
        assert_eq!(playback.loop_chances_to_use, 1);
        assert_eq!(playback.current_frame, 4);

        run(&mut playback, &table, &store, 4, None);
        assert_eq!(playback.current_slice, 0);
        assert_eq!(playback.current_frame, 0);
        assert_eq!(playback.loop_chances_to_use, 1);
    }

    #[test]
    fn test_loop_fade_is_non_increasing_then_resets() {
        let mut s0 = slice(0, 0, 1);
        s0.pass_threshold = 5;
        s0.loop_chances = 3;
        s0.fades_with_chances = true;
        s0.fail_slice = 1;
        let s1 = last(1, 2, 5);
        let table = SliceTable::new(vec![s0, s1], 1, 6).unwrap();
        let store = frames(6);
        let mut playback = Playback::new(&table, 0, 24);

        let mut brightness = vec![playback.tint.brightness()];
        for _ in 0..3 {
            run(&mut playback, &table, &store, 2, None);
            brightness.push(playback.tint.brightness());
        }
        assert!(brightness.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(playback.current_slice, 1);

        playback.tick(&table, &store, None);
        assert_eq!(playback.tint, Tint::default());
    }

    #[test]
    fn test_touch_resets_tint_on_plain_slice() {
        let mut s0 = slice(0, 0, 1);
        s0.pass_threshold = 5;
        s0.loop_chances = 2;
        s0.fades_with_chances = true;
        let table = SliceTable::new(vec![s0, last(1, 2, 3)], 1, 4).unwrap();
        let store = frames(4);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 2, None);
        assert!(playback.tint.brightness() < 1.0);
        playback.tick(&table, &store, Some(INSIDE));
        assert_eq!(playback.tint, Tint::default());
    }

    #[test]
    fn test_held_touch_pins_release_budget() {
        let mut s0 = slice(0, 0, 19);
        s0.loop_on_release = true;
        s0.pass_threshold = 100;
        s0.release_chances = 2;
        let table = SliceTable::new(vec![s0, last(1, 20, 21)], 1, 22).unwrap();
        let store = frames(22);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 5, Some(INSIDE));
        assert_eq!(playback.release_chances_to_use, 2);
        assert_eq!(playback.tint, Tint::default());

        playback.tick(&table, &store, None);
        assert_eq!(playback.release_chances_to_use, 1);
        assert_eq!(playback.tint, Tint::faded(1, 2));

        playback.tick(&table, &store, Some(INSIDE));
        assert_eq!(playback.release_chances_to_use, 2);
    }

    #[test]
    fn test_release_budget_exhaustion_falls_back() {
        let s0 = slice(0, 0, 9);
        let mut s1 = slice(1, 10, 19);
        s1.loop_on_release = true;
        s1.pass_threshold = 100;
        s1.release_chances = 1;
        s1.fail_slice = 0;
        let table = SliceTable::new(vec![s0, s1, last(2, 20, 21)], 1, 22).unwrap();
        let store = frames(22);
        let mut playback = Playback::new(&table, 1, 24);

        playback.tick(&table, &store, None);
        assert_eq!(playback.release_chances_to_use, 0);
        assert_eq!(playback.current_slice, 1);

        let effects = playback.tick(&table, &store, None);
        assert_eq!(playback.current_slice, 0);
        assert_eq!(playback.current_frame, 0);
        assert_eq!(effects[0], PlaybackEffect::SeekAudio { seconds: 0.0 });
    }

    #[test]
    fn test_pass_on_release_transitions_mid_slice() {
        let mut s0 = slice(0, 0, 19);
        s0.pass_on_release = true;
        let table = SliceTable::new(vec![s0, last(1, 20, 29)], 1, 30).unwrap();
        let store = frames(30);
        let mut playback = Playback::new(&table, 0, 20);

        run(&mut playback, &table, &store, 3, Some(INSIDE));
        assert_eq!(playback.current_slice, 0);
        assert_eq!(playback.current_frame, 3);

        let effects = playback.tick(&table, &store, None);
        assert_eq!(playback.current_slice, 1);
        assert_eq!(playback.current_frame, 20);
        assert_eq!(
            effects[0],
            PlaybackEffect::SliceCompleted {
                name: "Scene_Slice 0".into()
            }
        );
        assert!(effects.contains(&PlaybackEffect::SeekAudio { seconds: 1.0 }));
    }

    #[test]
    fn test_score_exactly_one_at_threshold() {
        let mut s0 = slice(0, 0, 9);
        s0.pass_threshold = 5;
        let table = SliceTable::new(vec![s0, last(1, 10, 11)], 1, 12).unwrap();
        let store = frames(12);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 5, Some(INSIDE));
        assert_eq!(playback.hotspots[0].score, 1.0);
        playback.tick(&table, &store, Some(INSIDE));
        assert_eq!(playback.hotspots[0].touched_frames, 6);
        assert_eq!(playback.hotspots[0].score, 1.0);
    }

    #[test]
    fn test_missing_hotspot_frame_clears_region() {
        let table = SliceTable::new(vec![slice(0, 0, 3), last(1, 4, 5)], 1, 6).unwrap();
        let mut store = FrameStore::new((0..6).map(|i| format!("frame_{}", i)).collect());
        store.push_region(FxHashMap::default());
        let mut playback = Playback::new(&table, 0, 24);

        playback.tick(&table, &store, Some(INSIDE));
        assert!(playback.hotspots[0].visual.is_none());
        assert!(playback.hotspots[0].collider.is_empty());
        assert_eq!(playback.hotspots[0].touched_frames, 0);
        assert_eq!(playback.primary_visual.as_deref(), Some("frame_0"));
    }

    #[test]
    fn test_last_slice_finishes_once() {
        let table = SliceTable::new(vec![last(0, 0, 1)], 1, 2).unwrap();
        let store = frames(2);
        let mut playback = Playback::new(&table, 0, 24);

        let effects = run(&mut playback, &table, &store, 2, None);
        assert!(playback.finished);
        assert_eq!(
            effects,
            vec![
                PlaybackEffect::SliceCompleted {
                    name: "Scene_Slice 0".into()
                },
                PlaybackEffect::Finished,
            ]
        );
        assert!(playback.tick(&table, &store, None).is_empty());
    }

    #[test]
    fn test_slice_entry_reset_is_idempotent() {
        let table = SliceTable::new(vec![slice(0, 0, 9), last(1, 10, 11)], 1, 12).unwrap();
        let store = frames(12);
        let mut playback = Playback::new(&table, 0, 24);
        run(&mut playback, &table, &store, 4, Some(INSIDE));

        playback.slice_entry_reset(&table);
        let (frame, played, touched) = (
            playback.current_frame,
            playback.hotspots[0].played_frames,
            playback.hotspots[0].touched_frames,
        );
        playback.slice_entry_reset(&table);
        assert_eq!(playback.current_frame, frame);
        assert_eq!(playback.hotspots[0].played_frames, played);
        assert_eq!(playback.hotspots[0].touched_frames, touched);
        assert_eq!(frame, 0);
    }

    #[test]
    fn test_first_passing_region_wins() {
        let mut s0 = branching(0, 5);
        s0.pass_threshold = 3;
        let table =
            SliceTable::new(vec![s0, last(1, 6, 7), last(2, 8, 9)], 2, 10).unwrap();
        let store = two_regions(10);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 3, Some(INSIDE_SECOND));
        run(&mut playback, &table, &store, 3, Some(INSIDE));
        assert_eq!(playback.current_slice, 1);
        assert_eq!(playback.current_frame, 6);
    }

    #[test]
    fn test_second_region_pass_takes_its_target() {
        let mut s0 = branching(0, 5);
        s0.pass_threshold = 3;
        let table =
            SliceTable::new(vec![s0, last(1, 6, 7), last(2, 8, 9)], 2, 10).unwrap();
        let store = two_regions(10);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 2, Some(INSIDE));
        run(&mut playback, &table, &store, 4, Some(INSIDE_SECOND));
        assert_eq!(playback.hotspots[0].touched_frames, 0);
        assert_eq!(playback.current_slice, 2);
        assert_eq!(playback.current_frame, 8);
    }

    #[test]
    fn test_pass_on_release_follows_released_region() {
        // holding region 0 leaves region 1 as the untouched one
        let mut s0 = branching(0, 9);
        s0.pass_on_release = true;
        let table =
            SliceTable::new(vec![s0, last(1, 10, 11), last(2, 12, 13)], 2, 14).unwrap();
        let store = two_regions(14);
        let mut playback = Playback::new(&table, 0, 24);

        let effects = playback.tick(&table, &store, Some(INSIDE));
        assert_eq!(playback.current_slice, 2);
        assert_eq!(playback.current_frame, 12);
        assert_eq!(
            effects[0],
            PlaybackEffect::SliceCompleted {
                name: "Scene_Slice 0".into()
            }
        );
    }

    #[test]
    fn test_pass_consumes_no_loop_chance() {
        let mut s0 = branching(0, 3);
        s0.pass_threshold = 2;
        s0.loop_chances = 1;
        s0.fades_with_chances = true;
        let mut s2 = slice(2, 6, 9);
        s2.next_slice = vec![2, 2];
        s2.loop_chances = 3;
        let table = SliceTable::new(vec![s0, last(1, 4, 5), s2], 2, 10).unwrap();
        let store = two_regions(10);
        let mut playback = Playback::new(&table, 0, 24);

        run(&mut playback, &table, &store, 4, Some(INSIDE_SECOND));
        assert_eq!(playback.current_slice, 2);
        assert_eq!(playback.loop_chances_to_use, 3);
        assert_eq!(playback.tint, Tint::default());
    }
}
