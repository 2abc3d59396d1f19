mod common;

use std::{cell::RefCell, rc::Rc};

use common::{frame, BrokenFactory, FakeFactory};
use components::Registry;
use crt::{
    CrtFeature, CrtPass, CrtSettings, Enqueue, FeatureSettings, RenderPassEvent, Renderer,
    ScriptablePass,
};
use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static ERRORS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

struct Capture;

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Error
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            ERRORS.with(|errors| errors.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

fn captured_errors() -> Vec<String> {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(LevelFilter::Error);
    ERRORS.with(|errors| errors.borrow().clone())
}

fn stack(settings: Option<CrtSettings>) -> Rc<RefCell<Registry>> {
    let mut stack = Registry::new();
    if let Some(settings) = settings {
        stack.insert(settings);
    }
    Rc::new(RefCell::new(stack))
}

#[test]
fn missing_material_logs_once_and_declares_nothing() {
    assert!(captured_errors().is_empty());

    let mut feature = CrtFeature::new(
        FeatureSettings {
            shader: None,
            ..Default::default()
        },
        stack(Some(CrtSettings::default())),
    );
    feature.create(&FakeFactory);
    assert!(feature.material().is_none());

    let mut frame = frame(1920, 1080, 0.);
    for _ in 0..3 {
        let mut renderer = Renderer::new();
        assert_eq!(
            feature.add_render_passes(&mut renderer),
            Enqueue::MissingMaterial
        );
        assert!(renderer.is_empty());
        renderer.record(&mut frame.graph, &frame.data);
    }

    assert!(frame.graph.passes().is_empty());
    let errors = captured_errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("Missing material"));
}

#[test]
fn failed_compilation_is_logged_and_skips_the_effect() {
    captured_errors();

    let mut feature = CrtFeature::new(
        FeatureSettings::default(),
        stack(Some(CrtSettings::default())),
    );
    feature.create(&BrokenFactory);
    assert!(feature.material().is_none());
    assert!(feature.pass().is_some());

    let mut renderer = Renderer::new();
    assert_eq!(
        feature.add_render_passes(&mut renderer),
        Enqueue::MissingMaterial
    );

    let errors = captured_errors();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[0].contains("does not compile"));
}

#[test]
fn inactive_or_absent_settings_enqueue_nothing() {
    for settings in [None, Some(CrtSettings::disabled())] {
        let mut feature = CrtFeature::new(FeatureSettings::default(), stack(settings));
        feature.create(&FakeFactory);

        let mut renderer = Renderer::new();
        assert_eq!(feature.add_render_passes(&mut renderer), Enqueue::Inactive);
        assert!(renderer.is_empty());
    }
}

#[test]
fn active_settings_enqueue_at_configured_event() {
    let volumes = stack(Some(CrtSettings::default()));
    let mut feature = CrtFeature::new(
        FeatureSettings {
            render_pass_event: RenderPassEvent::AfterRenderingPostProcessing,
            ..Default::default()
        },
        volumes.clone(),
    );
    feature.create(&FakeFactory);

    let mut frame = frame(1280, 720, 1.);
    let mut renderer = Renderer::new();
    assert_eq!(feature.add_render_passes(&mut renderer), Enqueue::Enqueued);
    assert_eq!(renderer.len(), 1);
    renderer.record(&mut frame.graph, &frame.data);
    assert_eq!(frame.graph.passes().len(), 2);

    let pass = feature.pass().unwrap();
    assert_eq!(
        pass.render_pass_event(),
        RenderPassEvent::AfterRenderingPostProcessing
    );
    assert_eq!(pass.settings(), Some(&CrtSettings::default()));
}

#[test]
fn settings_are_read_fresh_every_frame() {
    let volumes = stack(Some(CrtSettings::default()));
    let mut feature = CrtFeature::new(FeatureSettings::default(), volumes.clone());
    feature.create(&FakeFactory);

    volumes
        .borrow_mut()
        .get_mut::<CrtSettings>()
        .unwrap()
        .set_scanline_density(2000.);
    let mut renderer = Renderer::new();
    assert_eq!(feature.add_render_passes(&mut renderer), Enqueue::Enqueued);
    drop(renderer);
    let density = feature
        .pass()
        .and_then(CrtPass::settings)
        .map(CrtSettings::scanline_density);
    assert_eq!(density, Some(1000.));

    *volumes.borrow_mut().get_mut::<CrtSettings>().unwrap() = CrtSettings::disabled();
    let mut renderer = Renderer::new();
    assert_eq!(feature.add_render_passes(&mut renderer), Enqueue::Inactive);
}

#[test]
fn dispose_is_idempotent() {
    let mut feature = CrtFeature::new(
        FeatureSettings::default(),
        stack(Some(CrtSettings::default())),
    );
    feature.create(&FakeFactory);
    assert!(feature.material().is_some());

    feature.dispose();
    assert!(feature.material().is_none());
    assert!(!feature.pass().unwrap().has_material());

    feature.dispose();
    assert!(feature.material().is_none());

    let mut never_created = CrtFeature::new(FeatureSettings::default(), stack(None));
    never_created.dispose();
    never_created.dispose();
    assert!(never_created.material().is_none());
}

#[test]
fn recreate_after_dispose_restores_the_effect() {
    let mut feature = CrtFeature::new(
        FeatureSettings::default(),
        stack(Some(CrtSettings::default())),
    );
    feature.create(&FakeFactory);
    feature.dispose();

    let mut renderer = Renderer::new();
    assert_eq!(
        feature.add_render_passes(&mut renderer),
        Enqueue::MissingMaterial
    );
    drop(renderer);

    feature.create(&FakeFactory);
    let mut renderer = Renderer::new();
    assert_eq!(feature.add_render_passes(&mut renderer), Enqueue::Enqueued);
}
