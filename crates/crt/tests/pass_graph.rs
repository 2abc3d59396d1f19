mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use common::{frame, FakeMaterial, Frame, Trace};
use crt::{
    CrtPass, CrtSettings, DistortionParams, DistortionRecord, ScanlineParams, ScanlineRecord,
    ScriptablePass,
};
use glam::vec4;
use graph::{AccessFlags, TextureOrigin};

fn record(pass: &CrtPass, frame: &mut Frame) -> color_eyre::Result<()> {
    pass.record_render_graph(&mut frame.graph, &frame.data)
}

fn crt_pass(settings: CrtSettings) -> CrtPass {
    let mut pass = CrtPass::new(Some(Arc::new(FakeMaterial)));
    pass.setup(settings);
    pass
}

#[test]
fn second_pass_reads_temp_and_writes_camera_color() {
    let mut frame = frame(1920, 1080, 0.);
    record(&crt_pass(CrtSettings::default()), &mut frame).unwrap();

    let passes = frame.graph.passes();
    assert_eq!(passes.len(), 2);
    let (distortion, scanlines) = (&passes[0], &passes[1]);
    assert_eq!(distortion.name(), CrtPass::DISTORTION_PASS);
    assert_eq!(scanlines.name(), CrtPass::SCANLINE_PASS);

    let temp: Vec<_> = distortion.writes().collect();
    assert_eq!(temp.len(), 1);
    assert_eq!(distortion.reads().collect::<Vec<_>>(), vec![frame.color]);
    assert_eq!(scanlines.reads().collect::<Vec<_>>(), temp);
    assert_eq!(scanlines.writes().collect::<Vec<_>>(), vec![frame.color]);

    let attachment = scanlines.color_attachment().unwrap();
    assert_eq!(attachment.access, AccessFlags::Write);

    let temp_entry = frame.graph.textures().get(temp[0]).unwrap();
    assert_eq!(temp_entry.origin, TextureOrigin::Transient);
    assert_eq!(temp_entry.desc.name, CrtPass::TEMP_TEXTURE);
    assert_eq!(
        temp_entry.desc.format,
        frame.graph.texture_desc(frame.color).unwrap().format
    );
    frame.graph.compile().unwrap();
}

#[test]
fn distortion_only_still_declares_both_passes() {
    let mut settings = CrtSettings::disabled();
    settings.enable_distortion = true;
    settings.set_distortion_strength(0.3);

    let mut frame = frame(800, 600, 0.);
    record(&crt_pass(settings), &mut frame).unwrap();
    assert_eq!(frame.graph.passes().len(), 2);

    let distortion = frame.graph.passes()[0].data::<DistortionRecord>().unwrap();
    assert_relative_eq!(distortion.params.distortion_strength, 0.3);
    assert_eq!(distortion.params.chromatic_aberration_strength, 0.);

    let scanlines = frame.graph.passes()[1].data::<ScanlineRecord>().unwrap();
    assert_eq!(scanlines.params.scanline_strength, 0.);
    assert_eq!(scanlines.params.bloom_strength, 0.);
}

#[test]
fn no_settings_or_material_declares_nothing() {
    let mut frame = frame(640, 480, 0.);

    record(&CrtPass::new(Some(Arc::new(FakeMaterial))), &mut frame).unwrap();

    let mut pass = CrtPass::new(None);
    pass.setup(CrtSettings::default());
    record(&pass, &mut frame).unwrap();

    let mut released = crt_pass(CrtSettings::default());
    released.release_material();
    record(&released, &mut frame).unwrap();

    assert!(frame.graph.passes().is_empty());
    assert_eq!(frame.graph.textures().len(), 1);
}

#[test]
fn missing_frame_resources_is_an_error() {
    let mut frame = frame(640, 480, 0.);
    frame.data = components::Registry::new();

    let result = record(&crt_pass(CrtSettings::default()), &mut frame);
    assert!(result.is_err());
    assert!(frame.graph.passes().is_empty());
}

#[test]
fn resolution_follows_the_current_frame() {
    let pass = crt_pass(CrtSettings::default());

    for (width, height) in [(1920, 1080), (1280, 720)] {
        let mut frame = frame(width, height, 0.);
        record(&pass, &mut frame).unwrap();

        let resolution = vec4(width as f32, height as f32, 0., 0.);
        let distortion = frame.graph.passes()[0].data::<DistortionRecord>().unwrap();
        let scanlines = frame.graph.passes()[1].data::<ScanlineRecord>().unwrap();
        assert_eq!(distortion.params.screen_resolution, resolution);
        assert_eq!(scanlines.params.screen_resolution, resolution);

        let temp = frame.graph.texture_desc(distortion.destination).unwrap();
        assert_eq!((temp.width, temp.height), (width, height));
    }
}

#[test]
fn execution_blits_with_technique_per_pass() {
    let mut settings = CrtSettings::default();
    settings.set_noise_strength(0.15);
    let mut frame = frame(320, 240, 4.5);
    record(&crt_pass(settings), &mut frame).unwrap();

    let temp = frame.graph.passes()[0]
        .data::<DistortionRecord>()
        .unwrap()
        .destination;
    let color = frame.color;

    let mut trace = Trace::default();
    frame.graph.execute(&mut trace).unwrap();

    assert_eq!(trace.passes.len(), 2);
    let (name, target, blits) = &trace.passes[0];
    assert_eq!((name.as_str(), *target), (CrtPass::DISTORTION_PASS, temp));
    assert_eq!(blits.len(), 1);
    assert_eq!(blits[0].source, color);
    assert_eq!(blits[0].scale_bias, vec4(1., 1., 0., 0.));
    assert_eq!(blits[0].technique, DistortionParams::TECHNIQUE);
    let distortion: DistortionParams = bytemuck::pod_read_unaligned(&blits[0].params);
    assert_eq!(distortion, DistortionParams::new(&settings, vec4(320., 240., 0., 0.)));

    let (name, target, blits) = &trace.passes[1];
    assert_eq!((name.as_str(), *target), (CrtPass::SCANLINE_PASS, color));
    assert_eq!(blits[0].source, temp);
    assert_eq!(blits[0].technique, ScanlineParams::TECHNIQUE);
    let scanlines: ScanlineParams = bytemuck::pod_read_unaligned(&blits[0].params);
    assert_relative_eq!(scanlines.noise_strength, 0.15);
    assert_relative_eq!(scanlines.time, 4.5);
    assert_relative_eq!(scanlines.scanline_density, 400.);
}
