//! Benchmarks for the per-frame blend step.
//!
//! Run with: cargo bench -p posemix-blend-core

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Quat;
use posemix_blend_core::{
    BlendAsset, BlendCurve, BlendOptions, BoneChain, LayeredBlend, PoseBlender,
};
use posemix_test_fixtures::{ClipLibrary, FixtureSink, FixtureSkeleton, SpinningClip, StaticClip};

const DT: f32 = 1.0 / 60.0;

fn chain_asset(name: &str, bones: Vec<String>, is_animation: bool) -> BlendAsset {
    BlendAsset {
        name: name.into(),
        blend_time: 0.15,
        blend_curve: BlendCurve::default(),
        base_pose: "base".into(),
        overlay_pose: "overlay".into(),
        override_overlays: vec![],
        overlay_speed: 1.0,
        is_animation,
        layered_blends: vec![LayeredBlend {
            layer: BoneChain {
                name: "all".into(),
                bones,
            },
            base_weight: 0.7,
            additive_weight: 0.3,
            local_weight: 0.1,
        }],
        global_weight: 1.0,
    }
}

fn library(bones: usize) -> ClipLibrary {
    let mut clips = ClipLibrary::new();
    clips.insert("base", Arc::new(StaticClip::identity(bones)));
    clips.insert(
        "overlay",
        Arc::new(StaticClip::with_rotation(
            bones,
            bones / 2,
            Quat::from_rotation_y(0.5),
        )),
    );
    clips.insert(
        "spin",
        Arc::new(SpinningClip {
            duration: 2.0,
            looping: true,
            bone: bones / 2,
            radians_per_second: 1.0,
        }),
    );
    clips
}

fn bench_static_overlay(c: &mut Criterion) {
    for bones in [16usize, 64] {
        let skeleton = FixtureSkeleton::chain(bones);
        let names: Vec<String> = skeleton.bones.iter().map(|b| b.name.clone()).collect();
        let clips = library(bones);
        let mut blender = PoseBlender::bind(&skeleton, BlendOptions::default());
        blender.switch_configuration(
            &chain_asset("static", names, false),
            &clips,
            false,
            None,
            false,
        );
        let mut sink = FixtureSink::new(&skeleton);

        c.bench_function(&format!("blend_step_static_{bones}_bones"), |b| {
            b.iter(|| blender.update(black_box(DT), &mut sink));
        });
    }
}

fn bench_animated_overlay(c: &mut Criterion) {
    let bones = 64usize;
    let skeleton = FixtureSkeleton::chain(bones);
    let names: Vec<String> = skeleton.bones.iter().map(|b| b.name.clone()).collect();
    let clips = library(bones);
    let mut asset = chain_asset("animated", names, true);
    asset.overlay_pose = "spin".into();
    let mut blender = PoseBlender::bind(&skeleton, BlendOptions::default());
    blender.switch_configuration(&asset, &clips, false, None, false);
    let mut sink = FixtureSink::new(&skeleton);

    c.bench_function("blend_step_animated_64_bones", |b| {
        b.iter(|| blender.update(black_box(DT), &mut sink));
    });
}

fn bench_crossfade(c: &mut Criterion) {
    let bones = 64usize;
    let skeleton = FixtureSkeleton::chain(bones);
    let names: Vec<String> = skeleton.bones.iter().map(|b| b.name.clone()).collect();
    let clips = library(bones);
    let asset = chain_asset("fading", names, false);
    let mut blender = PoseBlender::bind(&skeleton, BlendOptions::default());
    let mut sink = FixtureSink::new(&skeleton);

    c.bench_function("switch_and_crossfade_64_bones", |b| {
        b.iter(|| {
            blender.switch_configuration(&asset, &clips, true, Some(0.1), true);
            for _ in 0..8 {
                blender.update(black_box(DT), &mut sink);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_static_overlay,
    bench_animated_overlay,
    bench_crossfade,
);
criterion_main!(benches);
