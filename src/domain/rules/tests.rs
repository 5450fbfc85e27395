// Unit tests for business rules

#[cfg(test)]
mod tests {
    use crate::domain::model::*;
    use crate::domain::rules::*;
    use crate::error::TimelapseError;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    fn target(seconds: f64) -> TargetDuration {
        TargetDuration::from_seconds(seconds).unwrap()
    }

    fn geometry(w: u32, h: u32, fit: FitMode) -> TargetGeometry {
        TargetGeometry::new(FrameSize::new(w, h).unwrap(), fit)
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|p| display_name(p)).collect()
    }

    #[test]
    fn test_speed_ratio_is_source_over_target() {
        for (source, tgt) in [(120.0, 30.0), (10.0, 40.0), (3600.0, 7.5), (1.0, 1.0)] {
            let plan = RetimePlanner::plan(source, target(tgt), None, 60).unwrap();
            assert_eq!(plan.speed_ratio(), source / tgt);
            assert!(plan.speed_ratio() > 0.0);
        }
    }

    #[test]
    fn test_plan_rejects_bad_source_duration() {
        assert!(RetimePlanner::plan(0.0, target(30.0), None, 60).is_err());
        assert!(RetimePlanner::plan(-3.0, target(30.0), None, 60).is_err());
        assert!(matches!(
            RetimePlanner::plan(10.0, target(30.0), None, 0),
            Err(TimelapseError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_stage_order_without_geometry() {
        let plan = RetimePlanner::plan(120.0, target(30.0), None, 25).unwrap();
        assert_eq!(plan.stages().len(), 2);
        assert_eq!(plan.filter_graph(), "setpts=PTS/4,fps=25");
        assert!(plan.geometry().is_none());
    }

    #[test]
    fn test_stage_order_with_geometry() {
        let plan =
            RetimePlanner::plan(60.0, target(30.0), Some(geometry(1280, 720, FitMode::Crop)), 60)
                .unwrap();
        assert!(matches!(plan.stages()[0], FilterStage::Retime { .. }));
        assert!(matches!(plan.stages()[1], FilterStage::FrameRate { fps: 60 }));
        assert!(matches!(plan.stages()[2], FilterStage::Geometry(_)));
        assert!(plan
            .filter_graph()
            .starts_with("setpts=PTS/2,fps=60,scale=1280:720:force_original_aspect_ratio=increase"));
    }

    #[test]
    fn test_resulting_size_per_fit_mode() {
        let sources = [
            FrameSize { width: 1920, height: 1080 },
            FrameSize { width: 1080, height: 1920 },
            FrameSize { width: 640, height: 480 },
            FrameSize { width: 1001, height: 333 },
        ];
        for source in sources {
            for fit in [FitMode::Pad, FitMode::Crop, FitMode::Stretch] {
                let plan =
                    RetimePlanner::plan(10.0, target(5.0), Some(geometry(1280, 720, fit)), 30).unwrap();
                assert_eq!(plan.resulting_size(source), FrameSize { width: 1280, height: 720 });
            }

            let contain =
                RetimePlanner::plan(10.0, target(5.0), Some(geometry(1280, 720, FitMode::Contain)), 30)
                    .unwrap();
            let size = contain.resulting_size(source);
            assert_eq!(size.width, 1280);
            assert_eq!(size.height % 2, 0);

            let untouched = RetimePlanner::plan(10.0, target(5.0), None, 30).unwrap();
            assert_eq!(untouched.resulting_size(source), source);
        }
    }

    #[test]
    fn test_contain_height_follows_aspect() {
        let plan =
            RetimePlanner::plan(10.0, target(5.0), Some(geometry(1280, 720, FitMode::Contain)), 30)
                .unwrap();
        // 4:3 source keeps 4:3, so the requested 720 is not honoured
        assert_eq!(
            plan.resulting_size(FrameSize { width: 640, height: 480 }),
            FrameSize { width: 1280, height: 960 }
        );
        assert_eq!(
            plan.resulting_size(FrameSize { width: 1920, height: 1080 }),
            FrameSize { width: 1280, height: 720 }
        );
    }

    #[test]
    fn test_output_name_format() {
        let input = Path::new("/videos/clip_1.mov");
        assert_eq!(
            OutputNaming::timelapse_output(input, target(30.0), None, "mp4"),
            PathBuf::from("/videos/clip_1_timelapse_30s_src_PR.mp4")
        );
        assert_eq!(
            OutputNaming::timelapse_output(
                input,
                target(12.5),
                Some(&geometry(1920, 1080, FitMode::Pad)),
                "mp4"
            ),
            PathBuf::from("/videos/clip_1_timelapse_12p5s_1920x1080_pad_PR.mp4")
        );
    }

    #[test]
    fn test_output_name_is_deterministic_and_injective() {
        let inputs = [Path::new("/v/a.mp4"), Path::new("/v/b.mp4")];
        let targets = [target(30.0), target(30.5), target(60.0)];
        let geometries = [
            None,
            Some(geometry(1920, 1080, FitMode::Contain)),
            Some(geometry(1920, 1080, FitMode::Pad)),
            Some(geometry(1280, 720, FitMode::Pad)),
        ];

        let mut seen = HashSet::new();
        for input in inputs {
            for tgt in targets {
                for geom in &geometries {
                    let first = OutputNaming::timelapse_output(input, tgt, geom.as_ref(), "mp4");
                    let second = OutputNaming::timelapse_output(input, tgt, geom.as_ref(), "mp4");
                    assert_eq!(first, second);
                    assert!(seen.insert(first), "collision detected");
                }
            }
        }
        assert_eq!(seen.len(), 2 * 3 * 4);
    }

    #[test]
    fn test_merged_names() {
        let folder = Path::new("/data/trip");
        assert_eq!(
            OutputNaming::merged_timelapse_output(folder, target(45.0), "mp4"),
            PathBuf::from("/data/trip/trip_merged_timelapse_45s.mp4")
        );
        assert_eq!(
            OutputNaming::merged_only_output(folder, "mp4"),
            PathBuf::from("/data/trip/trip_merged.mp4")
        );
    }

    #[test]
    fn test_passlog_base() {
        assert_eq!(
            OutputNaming::passlog_base(Path::new("/v/a_timelapse_30s_src_PR.mp4")),
            PathBuf::from("/v/a_timelapse_30s_src_PR_passlog")
        );
    }

    #[test]
    fn test_generated_artifacts_are_recognised() {
        for name in [
            "_temp_merged_1700000000.mp4",
            "_concat_list_1700000000.txt",
            "clip_timelapse_30s_src_PR.mp4",
            "trip_merged.mp4",
            "trip_merged_timelapse_30s.mp4",
        ] {
            assert!(OutputNaming::is_generated_artifact(name, "mp4"), "{name}");
        }
        for name in ["clip_1.mp4", "timelapse.mp4", "merged_holiday.mp4"] {
            assert!(!OutputNaming::is_generated_artifact(name, "mp4"), "{name}");
        }
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(SmartSort::trailing_number("part_10.mp4"), Some(10));
        assert_eq!(SmartSort::trailing_number("part10.mp4"), Some(10));
        assert_eq!(SmartSort::trailing_number("video_5"), Some(5));
        assert_eq!(SmartSort::trailing_number("random.mp4"), None);
        assert_eq!(SmartSort::trailing_number("2024.mp4"), None);
        assert_eq!(SmartSort::trailing_number("a_1b2.mp4"), Some(2));
        assert_eq!(
            SmartSort::trailing_number("clip_123456789012345678901234567890.mp4"),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_smart_sort_numbers_numerically() {
        let files = vec![
            PathBuf::from("clip_2.mp4"),
            PathBuf::from("clip_10.mp4"),
            PathBuf::from("clip_1.mp4"),
        ];
        assert_eq!(
            names(&SmartSort::sort(files)),
            vec!["clip_1.mp4", "clip_2.mp4", "clip_10.mp4"]
        );
    }

    #[test]
    fn test_smart_sort_numbered_before_unnumbered() {
        let files = vec![
            PathBuf::from("b.mp4"),
            PathBuf::from("video5.mp4"),
            PathBuf::from("a.mp4"),
        ];
        assert_eq!(
            names(&SmartSort::sort(files)),
            vec!["video5.mp4", "a.mp4", "b.mp4"]
        );
    }

    #[test]
    fn test_smart_sort_ties_break_on_name() {
        let files = vec![
            PathBuf::from("cam_b_3.mp4"),
            PathBuf::from("Cam_A_3.mp4"),
            PathBuf::from("cam_1.mp4"),
        ];
        assert_eq!(
            names(&SmartSort::sort(files)),
            vec!["cam_1.mp4", "Cam_A_3.mp4", "cam_b_3.mp4"]
        );
    }

    #[test]
    fn test_smart_sort_oversized_number_stays_numbered() {
        let files = vec![
            PathBuf::from("notes.mp4"),
            PathBuf::from("clip_99999999999999999999999.mp4"),
            PathBuf::from("clip_2.mp4"),
        ];
        assert_eq!(
            names(&SmartSort::sort(files)),
            vec!["clip_2.mp4", "clip_99999999999999999999999.mp4", "notes.mp4"]
        );
    }
}
