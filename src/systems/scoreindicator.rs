//! Keep score indicators in sync with their hotspot regions.
use bevy_ecs::prelude::*;

use crate::components::scoreindicator::ScoreIndicator;
use crate::resources::playback::Playback;
use crate::resources::slicetable::SliceTable;

/// Copy each region's score into its indicators and show them only on slices
/// flagged with `show_score`.
pub fn score_indicator_system(
    playback: Option<Res<Playback>>,
    slices: Option<Res<SliceTable>>,
    mut query: Query<&mut ScoreIndicator>,
) {
    let (Some(playback), Some(slices)) = (playback, slices) else {
        return;
    };
    let show = slices
        .get(playback.current_slice)
        .is_some_and(|s| s.show_score && !playback.finished);
    for mut indicator in query.iter_mut() {
        let fill = playback
            .hotspots
            .get(indicator.region)
            .map(|h| h.score)
            .unwrap_or(0.0);
        if indicator.fill != fill {
            indicator.fill = fill;
        }
        if indicator.visible != show {
            indicator.visible = show;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::slicetable::Slice;
    use raylib::prelude::Vector2;

    fn setup(show_score: bool) -> (World, Entity) {
        let mut world = World::new();
        let mut slice = Slice::new("s", 0, 9);
        slice.is_last_slice = true;
        slice.show_score = show_score;
        let table = SliceTable::new(vec![slice], 2, 10).unwrap();
        let mut playback = Playback::new(&table, 0, 24);
        playback.hotspots[1].score = 0.4;
        world.insert_resource(table);
        world.insert_resource(playback);
        let e = world
            .spawn(ScoreIndicator::new(1, Vector2 { x: 0.0, y: 0.0 }, 24.0))
            .id();
        (world, e)
    }

    #[test]
    fn test_indicator_mirrors_region_score() {
        let (mut world, e) = setup(true);
        let mut schedule = Schedule::default();
        schedule.add_systems(score_indicator_system);
        schedule.run(&mut world);

        let ind = world.get::<ScoreIndicator>(e).unwrap();
        assert_eq!(ind.fill, 0.4);
        assert!(ind.visible);
    }

    #[test]
    fn test_indicator_hidden_when_slice_hides_score() {
        let (mut world, e) = setup(false);
        let mut schedule = Schedule::default();
        schedule.add_systems(score_indicator_system);
        schedule.run(&mut world);

        assert!(!world.get::<ScoreIndicator>(e).unwrap().visible);
    }
}
