//! End-to-end flow: compose materials, share descriptors, light a scene,
//! and watch derived GPU data track changes lazily.

use std::sync::{Arc, Mutex};

use lantern_core::math::{Mat4, Vec3, Vec4};
use lantern_core::mesh::{generators, MeshInstance};
use lantern_graphics::lights::create_area_lights;
use lantern_graphics::materials::MATERIAL_DATA_SIZE;
use lantern_graphics::{
    Layer, LayerBlend, Light, LightEnvironment, Material, MaterialSystem,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn emissive_material(system: &Arc<MaterialSystem>, color: Vec3) -> Material {
    let mut material = Material::new("glow", system.clone());
    material
        .add_layer(Layer::emissive().with_albedo(Vec4::new(color.x, color.y, color.z, 1.0)))
        .unwrap();
    material
}

#[test]
fn materials_share_descriptors_across_a_scene() {
    init_logging();
    let system = MaterialSystem::shared();

    let mut wall = Material::new("wall", system.clone());
    wall.add_layer(
        Layer::lambert()
            .with_albedo(Vec4::new(0.9, 0.0, 0.0, 1.0))
            .with_blend(LayerBlend::Add),
    )
    .unwrap();
    wall.add_layer(
        Layer::conductor()
            .with_albedo(Vec4::new(0.9, 0.0, 0.0, 1.0))
            .with_blend(LayerBlend::Add),
    )
    .unwrap();

    let mut floor = Material::new("floor", system.clone());
    floor
        .add_layer(
            Layer::lambert()
                .with_albedo(Vec4::new(0.2, 0.2, 0.2, 1.0))
                .with_blend(LayerBlend::Add),
        )
        .unwrap();
    floor
        .add_layer(
            Layer::conductor()
                .with_albedo(Vec4::new(0.1, 0.1, 0.1, 1.0))
                .with_blend(LayerBlend::Add),
        )
        .unwrap();

    wall.finalize().unwrap();
    floor.finalize().unwrap();

    // Same shape, different numbers: one interned descriptor.
    assert_eq!(wall.descriptor_id(), floor.descriptor_id());
    assert_eq!(system.descriptor_count(), 1);

    // The wall exceeded the energy budget (0.9 + 0.9) and was renormalized;
    // its layer PMFs cover the whole stack.
    let data = wall.data().unwrap();
    assert!((data.values.layers[0].albedo[0] - 0.5).abs() < 1e-5);
    let pmf_sum: f32 = data.values.layers[..2].iter().map(|l| l.pmf).sum();
    assert!((pmf_sum - 1.0).abs() < 1e-5);
    assert_eq!(wall.parameter_block().unwrap().byte_size(), MATERIAL_DATA_SIZE);
}

#[test]
fn area_lights_feed_the_environment() {
    init_logging();
    let system = MaterialSystem::shared();
    let glow = emissive_material(&system, Vec3::new(2.0, 1.0, 0.5));
    let mut plain = Material::new("plain", system.clone());
    plain.add_layer(Layer::lambert()).unwrap();

    let lamp = Arc::new(MeshInstance::new(
        Arc::new(generators::quad(1.0, 1.0).with_name("lamp")),
        Mat4::identity(),
    ));
    let prop = Arc::new(MeshInstance::new(
        Arc::new(generators::quad(1.0, 1.0)),
        Mat4::identity(),
    ));

    // Only the emissive instance becomes a light.
    let lights = create_area_lights(&[
        (lamp.clone(), Some(&glow)),
        (prop, Some(&plain)),
    ]);
    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0].lock().unwrap().name(), "lamp");
    assert_eq!(lights[0].lock().unwrap().data().intensity, [2.0, 1.0, 0.5]);

    let mut env = LightEnvironment::new("env");
    env.add_light(Arc::new(Mutex::new(Light::point("fill"))))
        .unwrap();
    for light in lights {
        env.add_light(light).unwrap();
    }

    // Building the block prepares area sampling: unit quad, CDF [0, 0.5, 1].
    env.parameter_block().unwrap();
    let lamp_light = env.light(1).unwrap().lock().unwrap();
    let sampling = lamp_light.sampling().unwrap();
    assert_eq!(sampling.cdf, vec![0.0, 0.5, 1.0]);
    assert!((sampling.surface_area - 1.0).abs() < 1e-6);
}

#[test]
fn environment_rebuilds_lazily_as_the_scene_mutates() {
    init_logging();
    let mut env = LightEnvironment::new("env");
    let sun = Arc::new(Mutex::new(Light::directional("sun")));
    let bulb = Arc::new(Mutex::new(Light::point("bulb")));
    env.add_light(sun.clone()).unwrap();
    env.add_light(bulb.clone()).unwrap();

    env.parameter_block().unwrap();
    let v1 = env.aggregate_version();
    // Stable scene: repeated reads observe the same aggregate version.
    assert_eq!(env.aggregate_version(), v1);

    // A batch of mutations across both lights advances the aggregate by one.
    sun.lock().unwrap().set_intensity(Vec3::new(10.0, 10.0, 9.0));
    bulb.lock()
        .unwrap()
        .move_to(Vec3::new(0.0, 2.0, 0.0), Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
    let v2 = env.aggregate_version();
    assert_eq!(v2.value(), v1.value() + 1);

    // The rebuilt block reflects the moved bulb.
    env.parameter_block().unwrap();
    assert_eq!(
        env.light(1).unwrap().lock().unwrap().data().world_pos,
        [0.0, 2.0, 0.0]
    );
}
