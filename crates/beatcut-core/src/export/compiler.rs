// crates/beatcut-core/src/export/compiler.rs
//
// The graph walk.
//
// Deterministic, straight-line compilation:
//
//   1. seed the canvas with a black color source              [bg]
//   2. walk tracks bottom-to-top (reverse project order),
//      clips in timeline order, dispatching through the
//      clip registry; each handled clip advances the
//      accumulator pad and the filter index
//   3. burn project-level lyrics                              [subbed]
//   4. pin the terminal video format                          [vout]
//   5. build the audio mix                                    [aout]
//
// Every iteration order derives from stable keys (asset ids, track/clip
// indices, registry order), so recompiling an unchanged project emits a
// byte-identical string. Elements returning None are expected skips; only
// graph invariant violations abort.

use crate::error::ExportError;
use crate::export::ass::build_ass;
use crate::export::audio::build_audio_mix;
use crate::export::context::{ExportBundle, ExportContext, InputSpec};
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::{escape_filter_path, ts};
use crate::registry::{clip_registry, first_matching};
use crate::state::{Project, TrackKind};

/// Everything the driver needs to run ffmpeg.
#[derive(Clone, Debug)]
pub struct CompiledExport {
    pub inputs:         Vec<InputSpec>,
    pub filter_complex: String,
    pub video_out:      String,
    pub audio_out:      String,
    pub duration:       f64,
}

pub fn compile(project: &Project, bundle: &ExportBundle) -> Result<CompiledExport, ExportError> {
    let ctx = ExportContext::build(project, bundle);
    let mut graph = FilterGraph::new();

    let (w, h) = (ctx.resolution.width, ctx.resolution.height);
    let duration = ctx.duration();
    graph.push_source(
        format!("color=c=black:s={w}x{h}:d={}", ts(duration)),
        &["bg"],
        "canvas",
    )?;

    let registry = clip_registry();
    let mut prev = "bg".to_string();
    let mut filter_idx = 0usize;

    for track in project.tracks.iter().rev() {
        if track.muted || matches!(track.kind, TrackKind::Audio | TrackKind::Effect) {
            continue;
        }
        for clip in &track.clips {
            let Some(element) = first_matching(&registry, clip, track) else {
                log::debug!("no element handles clip {} on {:?} track", clip.id, track.kind);
                continue;
            };
            if let Some(out) =
                element.export_build(&mut graph, &prev, clip, track, filter_idx, &ctx)?
            {
                prev = out.output_pad;
                filter_idx = out.next_filter_idx;
            }
        }
    }

    if let Some(lyrics) = &project.lyrics {
        if !lyrics.words.is_empty() {
            let content = build_ass(&lyrics.words, &lyrics.style, -ctx.span.0);
            let path = ctx.write_side_file("lyrics.ass", &content)?;
            graph.push(
                &[&prev],
                format!("subtitles='{}'", escape_filter_path(&path.display().to_string())),
                &["subbed"],
                "project lyrics",
            )?;
            prev = "subbed".into();
        }
    }

    graph.push(&[&prev], "format=yuv420p", &["vout"], "terminal video")?;
    let audio_out = build_audio_mix(&mut graph, &ctx)?;

    let filter_complex = graph.finish(&["vout", audio_out.as_str()])?;
    Ok(CompiledExport {
        inputs: ctx.inputs,
        filter_complex,
        video_out: "vout".into(),
        audio_out,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::color;
    use crate::state::{
        BeatsData, Clip, ClipBody, CutoutMode, EffectConfig, EffectKind, LyricWord, LyricsData,
        LyricsStyle, Project, Track, Transform, WorkArea,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn empty_bundle() -> ExportBundle<'static> {
        ExportBundle {
            asset_paths:     HashMap::new(),
            mask_paths:      HashMap::new(),
            clip_audio_wavs: HashMap::new(),
            beats:           HashMap::new(),
            project_dir:     PathBuf::from("/proj"),
            write_file:      Box::new(|_, _| Ok(())),
        }
    }

    fn video_clip(track_id: Uuid, asset: Uuid, start: f64, end: f64) -> Clip {
        Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(asset),
            track_id,
            timeline_start: start,
            timeline_end:   end,
            source_start:   0.0,
            source_end:     end - start,
            body:           ClipBody::Video {
                transform:         Transform::default(),
                use_clip_audio:    false,
                clip_audio_volume: 1.0,
            },
        }
    }

    fn single_clip_project(asset: Uuid) -> Project {
        let mut p = Project::new("t");
        let mut track = Track::new(crate::state::TrackKind::Video, "V1");
        track.clips.push(video_clip(track.id, asset, 0.0, 3.0));
        p.tracks.push(track);
        p.duration = 3.0;
        p
    }

    fn attach_effect(p: &mut Project, parent: Uuid, config: EffectConfig, start: f64, end: f64) {
        let mut fx = Track::new(crate::state::TrackKind::Effect, "FX");
        fx.effect_kind = Some(config.kind());
        fx.parent_track_id = Some(parent);
        fx.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       None,
            track_id:       fx.id,
            timeline_start: start,
            timeline_end:   end,
            source_start:   0.0,
            source_end:     end - start,
            body:           ClipBody::Effect { config },
        });
        p.tracks.push(fx);
    }

    /// Split one `[a][b]body[c]` statement into input and output labels.
    /// None of the bodies the compiler emits contain square brackets.
    fn split_stmt(stmt: &str) -> (Vec<&str>, Vec<&str>) {
        let mut rest = stmt;
        let mut ins = Vec::new();
        while rest.starts_with('[') {
            let end = rest.find(']').expect("unterminated input label");
            ins.push(&rest[1..end]);
            rest = &rest[end + 1..];
        }
        let mut outs = Vec::new();
        while rest.ends_with(']') {
            let start = rest.rfind('[').expect("unterminated output label");
            outs.push(&rest[start + 1..rest.len() - 1]);
            rest = &rest[..start];
        }
        outs.reverse();
        (ins, outs)
    }

    /// Every labeled output pad appears exactly once as an output and at
    /// most once as an input across the serialized graph.
    fn assert_pad_invariants(filter_complex: &str) {
        let mut produced: HashMap<String, usize> = HashMap::new();
        let mut consumed: HashMap<String, usize> = HashMap::new();
        for stmt in filter_complex.split(';') {
            let (ins, outs) = split_stmt(stmt);
            for pad in ins {
                if !pad.contains(':') {
                    *consumed.entry(pad.to_string()).or_default() += 1;
                }
            }
            for pad in outs {
                *produced.entry(pad.to_string()).or_default() += 1;
            }
        }
        for (pad, n) in &produced {
            assert_eq!(*n, 1, "pad [{pad}] produced {n} times");
        }
        for (pad, n) in &consumed {
            assert!(*n <= 1, "pad [{pad}] consumed {n} times");
            assert!(produced.contains_key(pad), "pad [{pad}] consumed but never produced");
        }
    }

    // ── Scenario 1: empty project ───────────────────────────────────────────

    #[test]
    fn empty_project_compiles_to_bare_canvas() {
        let mut p = Project::new("t");
        p.duration = 0.5;
        let out = compile(&p, &empty_bundle()).unwrap();
        assert_eq!(
            out.filter_complex,
            "color=c=black:s=1080x1920:d=0.5000[bg];\
             [bg]format=yuv420p[vout];\
             [0:a]atrim=0:0.5000,asetpts=PTS-STARTPTS[aout]"
        );
        assert_eq!(out.inputs.len(), 1);
        assert_eq!(out.video_out, "vout");
        assert_eq!(out.audio_out, "aout");
    }

    // ── Scenario 2: single video clip ───────────────────────────────────────

    #[test]
    fn single_video_clip_graph_shape() {
        let asset = Uuid::from_u128(1);
        let p = single_clip_project(asset);
        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));

        let out = compile(&p, &bundle).unwrap();
        assert!(out.filter_complex.contains(
            "[1:v]trim=0.0000:3.0000,setpts=PTS-STARTPTS+0.0000/TB,\
             scale=1080:1920:force_original_aspect_ratio=increase,\
             crop=1080:1920,format=yuv420p[clip0]"
        ));
        assert!(out
            .filter_complex
            .contains("[bg][clip0]overlay=0:0:enable='between(t,0.0000,3.0000)'[ov0]"));
        assert!(out.filter_complex.contains("[ov0]format=yuv420p[vout]"));
        assert_pad_invariants(&out.filter_complex);
    }

    // ── Scenario 3: beat-zoom crop sits inside the base chain ──────────────

    #[test]
    fn beat_zoom_crop_precedes_scale() {
        let song = Uuid::from_u128(1);
        let video_asset = Uuid::from_u128(2);
        let mut p = single_clip_project(video_asset);
        let video_track = p.tracks[0].id;

        let mut audio = Track::new(crate::state::TrackKind::Audio, "A1");
        audio.is_master = true;
        audio.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(song),
            track_id:       audio.id,
            timeline_start: 0.0,
            timeline_end:   3.0,
            source_start:   0.0,
            source_end:     3.0,
            body:           ClipBody::Audio { volume: 1.0 },
        });
        p.tracks.push(audio);
        attach_effect(
            &mut p,
            video_track,
            EffectConfig::BeatZoom {
                enabled:       true,
                intensity:     0.1,
                duration_ms:   150.0,
                beat_division: 1,
            },
            0.0,
            3.0,
        );

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(video_asset, PathBuf::from("/v.mp4"));
        bundle.asset_paths.insert(song, PathBuf::from("/s.wav"));
        bundle.beats.insert(song, BeatsData { tempo: 120.0, beats: vec![1.0] });

        let out = compile(&p, &bundle).unwrap();
        let crop_at = out
            .filter_complex
            .find("crop=w='if(gt(between(t,1.0000,1.1500),0),iw/1.100000,iw)'")
            .expect("beat-zoom crop missing");
        let scale_at = out.filter_complex.find("scale=1080:1920").unwrap();
        assert!(crop_at < scale_at, "crop must be inlined before scale");
        assert_pad_invariants(&out.filter_complex);
    }

    // ── Scenario 4: cutout removeBg label set ───────────────────────────────

    #[test]
    fn cutout_emits_mask_chain_with_split() {
        let asset = Uuid::from_u128(1);
        let mut p = single_clip_project(asset);
        let video_track = p.tracks[0].id;
        attach_effect(
            &mut p,
            video_track,
            EffectConfig::Cutout {
                enabled:    true,
                mode:       CutoutMode::RemoveBg,
                background: color::BLACK,
            },
            0.0,
            3.0,
        );

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
        bundle.mask_paths.insert(asset, PathBuf::from("/a_mask.mp4"));

        let out = compile(&p, &bundle).unwrap();
        let s = &out.filter_complex;
        assert!(s.contains("[2:v]trim=0.0000:3.0000"));
        assert!(s.contains("[cut_maskt_0]split[cut_maska_0][cut_maskb_0]"));
        assert!(s.contains("[cut_maska_0]negate[cut_minv_0]"));
        assert!(s.contains("color=c=0x000000:s=1080x1920:d=3.0000[cut_bg_0]"));
        assert!(s.contains("[clip0][cut_maskb_0]blend=all_mode=multiply[cut_subj_0]"));
        assert!(s.contains("[cut_bg_0][cut_minv_0]blend=all_mode=multiply[cut_bgm_0]"));
        assert!(s.contains("[cut_subj_0][cut_bgm_0]blend=all_mode=addition[cut_out_0]"));
        assert_eq!(s.matches("cut_maskt_0").count(), 2);
        // The overlay consumes the cutout output, not the bare clip pad.
        assert!(s.contains("[bg][cut_out_0]overlay="));
        assert_pad_invariants(s);
    }

    // ── Scenario 5: shadows-only color grade ───────────────────────────────

    #[test]
    fn shadows_only_grade_is_one_geq_node() {
        let asset = Uuid::from_u128(1);
        let mut p = single_clip_project(asset);
        let video_track = p.tracks[0].id;
        attach_effect(
            &mut p,
            video_track,
            EffectConfig::ColorGrade {
                enabled:    true,
                contrast:   1.0,
                brightness: 0.0,
                saturation: 1.0,
                hue:        0.0,
                shadows:    0.5,
                highlights: 0.0,
            },
            0.0,
            3.0,
        );

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
        let out = compile(&p, &bundle).unwrap();
        let s = &out.filter_complex;
        assert!(s.contains(
            "[clip0]format=rgb24,geq=r='clip(r(X,Y)/255+0.500000*(1-r(X,Y)/255)*(1-r(X,Y)/255)\
             +0.000000*r(X,Y)/255*r(X,Y)/255,0,1)*255'"
        ));
        assert!(s.contains(",format=yuv420p[cg0_0]"));
        assert!(s.contains("[bg][cg0_0]overlay="));
        assert_pad_invariants(s);
    }

    // ── Scenario 6: lyrics clip writes ASS and burns subtitles ─────────────

    #[test]
    fn lyrics_clip_writes_ass_and_chains_subtitles() {
        let mut p = Project::new("t");
        let mut track = Track::new(crate::state::TrackKind::Lyrics, "L1");
        track.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       None,
            track_id:       track.id,
            timeline_start: 0.0,
            timeline_end:   1.0,
            source_start:   0.0,
            source_end:     1.0,
            body:           ClipBody::Lyrics {
                words: vec![
                    LyricWord { word: "Hello".into(), start: 0.0, end: 0.5 },
                    LyricWord { word: "World".into(), start: 0.5, end: 1.0 },
                ],
                style: LyricsStyle::default(),
            },
        });
        p.tracks.push(track);
        p.duration = 1.0;

        let written: Mutex<Vec<(PathBuf, String)>> = Mutex::new(Vec::new());
        let bundle = ExportBundle {
            asset_paths:     HashMap::new(),
            mask_paths:      HashMap::new(),
            clip_audio_wavs: HashMap::new(),
            beats:           HashMap::new(),
            project_dir:     PathBuf::from("/proj"),
            write_file:      Box::new(|path, content| {
                written.lock().unwrap().push((path.into(), content.into()));
                Ok(())
            }),
        };

        let out = compile(&p, &bundle).unwrap();
        assert!(out.filter_complex.contains("[bg]subtitles='/proj/lyrics_0.ass'[lyr0]"));
        assert!(out.filter_complex.contains("[lyr0]format=yuv420p[vout]"));

        let files = written.lock().unwrap();
        assert_eq!(files.len(), 1);
        let ass = &files[0].1;
        assert!(ass.contains("[Script Info]"));
        assert!(ass.contains("[V4+ Styles]"));
        assert!(ass.contains(",1,3,0,2,40,40,120,1")); // bottom → alignment 2
        assert_eq!(ass.matches("Dialogue:").count(), 2);
    }

    // ── Cross-cutting properties ───────────────────────────────────────────

    #[test]
    fn effect_chain_order_is_registry_order() {
        let asset = Uuid::from_u128(1);
        let song = Uuid::from_u128(9);
        let mut p = single_clip_project(asset);
        let video_track = p.tracks[0].id;

        let mut audio = Track::new(crate::state::TrackKind::Audio, "A1");
        audio.is_master = true;
        audio.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(song),
            track_id:       audio.id,
            timeline_start: 0.0,
            timeline_end:   3.0,
            source_start:   0.0,
            source_end:     3.0,
            body:           ClipBody::Audio { volume: 1.0 },
        });
        p.tracks.push(audio);

        attach_effect(&mut p, video_track, EffectConfig::default_for(EffectKind::BeatZoom), 0.0, 3.0);
        attach_effect(&mut p, video_track, EffectConfig::default_for(EffectKind::Cutout), 0.0, 3.0);
        attach_effect(&mut p, video_track, EffectConfig::default_for(EffectKind::Cartoon), 0.0, 3.0);
        attach_effect(
            &mut p,
            video_track,
            EffectConfig::ColorGrade {
                enabled:    true,
                contrast:   1.2,
                brightness: 0.0,
                saturation: 1.0,
                hue:        0.0,
                shadows:    0.0,
                highlights: 0.0,
            },
            0.0,
            3.0,
        );

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
        bundle.asset_paths.insert(song, PathBuf::from("/s.wav"));
        bundle.mask_paths.insert(asset, PathBuf::from("/a_mask.mp4"));
        bundle.beats.insert(song, BeatsData { tempo: 120.0, beats: vec![1.0] });

        let out = compile(&p, &bundle).unwrap();
        let s = &out.filter_complex;

        // BeatZoom's crop lives inside the base chain, before scale.
        let clip_stmt = s.split(';').find(|st| st.ends_with("[clip0]")).unwrap();
        assert!(clip_stmt.contains("crop=w='if(gt(between"));
        assert!(clip_stmt.find("crop=w=").unwrap() < clip_stmt.find("scale=").unwrap());

        // Then cutout → cartoon → color-grade, threaded in order.
        assert!(s.contains("[clip0][cut_maskb_0]blend"));
        assert!(s.contains("[cut_out_0]split[cza_0][czb_0]"));
        assert!(s.contains("[cz_0]eq=contrast=1.200000"));
        assert!(s.contains("[bg][cg0_0]overlay="));
        assert_pad_invariants(s);
    }

    #[test]
    fn skip_on_missing_input_leaves_prev_pad_untouched() {
        let asset = Uuid::from_u128(1);
        let p = single_clip_project(asset);
        // No asset path in the bundle: the clip contributes nothing.
        let out = compile(&p, &empty_bundle()).unwrap();
        assert!(out.filter_complex.contains("[bg]format=yuv420p[vout]"));
        assert!(!out.filter_complex.contains("clip0"));
    }

    #[test]
    fn compilation_is_deterministic() {
        let asset = Uuid::from_u128(1);
        let mut p = single_clip_project(asset);
        let video_track = p.tracks[0].id;
        attach_effect(&mut p, video_track, EffectConfig::default_for(EffectKind::Cutout), 0.5, 2.0);
        p.lyrics = Some(LyricsData {
            words: vec![LyricWord { word: "go".into(), start: 0.2, end: 0.9 }],
            style: LyricsStyle::default(),
        });

        let make_bundle = || {
            let mut b = empty_bundle();
            b.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
            b.mask_paths.insert(asset, PathBuf::from("/a_mask.mp4"));
            b
        };
        let a = compile(&p, &make_bundle()).unwrap();
        let b = compile(&p, &make_bundle()).unwrap();
        assert_eq!(a.filter_complex, b.filter_complex);
        assert_eq!(a.inputs, b.inputs);
    }

    #[test]
    fn project_lyrics_append_subbed_after_clips() {
        let asset = Uuid::from_u128(1);
        let mut p = single_clip_project(asset);
        p.lyrics = Some(LyricsData {
            words: vec![LyricWord { word: "hey".into(), start: 0.0, end: 1.0 }],
            style: LyricsStyle::default(),
        });
        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));

        let out = compile(&p, &bundle).unwrap();
        assert!(out.filter_complex.contains("[ov0]subtitles='/proj/lyrics.ass'[subbed]"));
        assert!(out.filter_complex.contains("[subbed]format=yuv420p[vout]"));
    }

    #[test]
    fn manual_work_area_offsets_and_trims() {
        let asset = Uuid::from_u128(1);
        let mut p = Project::new("t");
        let mut track = Track::new(crate::state::TrackKind::Video, "V1");
        track.clips.push(video_clip(track.id, asset, 0.0, 10.0));
        p.tracks.push(track);
        p.duration = 10.0;
        p.work_area = Some(WorkArea { start: 2.0, end: 6.0, is_manual: true });

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));

        let out = compile(&p, &bundle).unwrap();
        assert_eq!(out.duration, 4.0);
        assert!(out.filter_complex.starts_with("color=c=black:s=1080x1920:d=4.0000[bg]"));
        // Source window shifts by the work-area start; enable is local.
        assert!(out.filter_complex.contains("trim=2.0000:6.0000"));
        assert!(out.filter_complex.contains("enable='between(t,0.0000,4.0000)'"));
    }

    #[test]
    fn project_built_through_the_editor_compiles_clean() {
        use crate::state::{TextStyle, TrackKind};
        use crate::timeline::{ClipPatch, Editor};

        let mut ed = Editor::new(Project::new("session"));
        let video_asset = Uuid::from_u128(1);
        let song = Uuid::from_u128(2);
        ed.register_asset_duration(video_asset, 10.0);
        ed.register_asset_duration(song, 60.0);

        let v1 = ed.add_track(TrackKind::Video, "V1").unwrap();
        let a1 = ed.add_track(TrackKind::Audio, "A1").unwrap();
        let t1 = ed.add_track(TrackKind::Text, "T1").unwrap();
        ed.reorder_track(2, 0).unwrap(); // titles above the video lane
        ed.add_clip(a1, Some(song), 0.0, 6.0, ClipBody::Audio { volume: 1.0 })
            .unwrap();
        ed.set_master_audio(a1).unwrap();

        let c1 = ed
            .add_clip(
                v1,
                Some(video_asset),
                0.0,
                6.0,
                ClipBody::Video {
                    transform:         Transform::default(),
                    use_clip_audio:    false,
                    clip_audio_volume: 1.0,
                },
            )
            .unwrap();
        let right = ed.split_clip(c1, 3.0).unwrap();
        ed.update_clip(
            right,
            ClipPatch {
                transform: Some(Transform { scale: 0.5, ..Transform::default() }),
                ..Default::default()
            },
        )
        .unwrap();
        ed.add_clip(
            t1,
            None,
            1.0,
            2.0,
            ClipBody::Text {
                content:   "drop".into(),
                style:     TextStyle::default(),
                transform: Transform::default(),
            },
        )
        .unwrap();
        let fx = ed.add_effect_track(EffectKind::BeatZoom, v1, "FX").unwrap();
        ed.add_clip(
            fx,
            None,
            0.0,
            6.0,
            ClipBody::Effect { config: EffectConfig::default_for(EffectKind::BeatZoom) },
        )
        .unwrap();

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(video_asset, PathBuf::from("/v.mp4"));
        bundle.asset_paths.insert(song, PathBuf::from("/s.wav"));
        bundle
            .beats
            .insert(song, BeatsData { tempo: 120.0, beats: vec![0.5, 1.0, 1.5] });

        let out = compile(&ed.project, &bundle).unwrap();
        let s = &out.filter_complex;

        // Both video halves and the text land on the accumulator.
        assert!(s.contains("[clip0]"));
        assert!(s.contains("[clip1]"));
        assert!(s.contains("drawtext=text='drop'"));
        // The split's right half carries its own scale.
        assert!(s.contains("scale=540:960"));
        // Beat-zoom fires on the master beats inside the clips.
        assert!(s.contains("between(t,0.5000,0.6500)"));
        // Master audio is mixed.
        assert!(s.contains("amix=inputs=2:duration=longest[aout]"));
        assert_pad_invariants(s);

        let again = compile(&ed.project, &bundle).unwrap();
        assert_eq!(again.filter_complex, out.filter_complex);
    }

    #[test]
    fn two_clips_chain_overlays() {
        let asset = Uuid::from_u128(1);
        let mut p = Project::new("t");
        let mut track = Track::new(crate::state::TrackKind::Video, "V1");
        track.clips.push(video_clip(track.id, asset, 0.0, 2.0));
        track.clips.push(video_clip(track.id, asset, 2.0, 4.0));
        p.tracks.push(track);
        p.duration = 4.0;

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));

        let out = compile(&p, &bundle).unwrap();
        let s = &out.filter_complex;
        assert!(s.contains("[bg][clip0]overlay="));
        assert!(s.contains("[ov0][clip1]overlay="));
        assert!(s.contains("[ov1]format=yuv420p[vout]"));
        assert_pad_invariants(s);
    }
}
