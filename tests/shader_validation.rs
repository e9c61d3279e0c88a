//! Every WGSL pipeline source must parse and validate.

use vfxe::gpu::shaders;

/// Validates WGSL code using naga.
fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn entry_points(module: &naga::Module) -> Vec<&str> {
    module.entry_points.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn test_all_shaders_validate() {
    for (name, source) in shaders::ALL {
        if let Err(e) = validate_wgsl(source) {
            panic!("{} shader: {}", name, e);
        }
    }
}

#[test]
fn test_shaders_expose_render_entry_points() {
    for (name, source) in shaders::ALL {
        let module = validate_wgsl(source).unwrap();
        let entries = entry_points(&module);
        assert!(entries.contains(&"vs_main"), "{} has no vs_main", name);
        assert!(entries.contains(&"fs_main"), "{} has no fs_main", name);
    }
}

#[test]
fn test_fullscreen_passes_share_camera_binding() {
    for source in [shaders::VOLUMETRIC, shaders::RAYTRACE] {
        let module = validate_wgsl(source).unwrap();
        let bound: Vec<(u32, u32)> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref().map(|b| (b.group, b.binding)))
            .collect();
        assert!(bound.contains(&(0, 0)));
        assert!(bound.contains(&(1, 0)));
    }
}
