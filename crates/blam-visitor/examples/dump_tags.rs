//! Print the header and directory of a cache map, then walk its bitmaps,
//! environment shaders and structure BSPs in dependency order.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example dump_tags -- maps/bloodgulch.map
//! RUST_LOG=debug cargo run --example dump_tags -- maps/bloodgulch.map
//! ```

use std::collections::BTreeMap;
use std::error::Error;

use blam_cache::tags::bitmap::Bitmap;
use blam_cache::tags::scenario::Scenario;
use blam_cache::tags::shader::ShaderEnvironment;
use blam_cache::{MapConfig, MapFile, TagClass};
use blam_visitor::{FnVisitor, TagDispatcher};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: dump_tags <map file>");
        std::process::exit(2);
    };

    let file = MapFile::open(&path)?;
    // Tolerate modded maps with unusual version numbers
    let map = file.directory_with_config(&MapConfig::default().with_require_known_version(false))?;
    let header = map.header();

    println!("Map:       {path}");
    println!("Version:   {}", header.version());
    println!("Scenario:  {} ({:?})", header.scenario_name(), header.scenario_type());
    println!("Build:     {}", header.build());
    println!("Tags:      {}", map.len());
    println!("Heap base: {:#010x}", map.heap_base());

    let mut per_class: BTreeMap<String, usize> = BTreeMap::new();
    for entry in map.entries() {
        *per_class.entry(entry.primary_class().to_string()).or_default() += 1;
    }
    println!();
    for (class, count) in &per_class {
        println!("  {class:>4}  {count}");
    }

    let mut pixel_bytes = 0usize;
    let mut shader_maps = 0usize;
    let mut triangles = 0usize;

    let mut dispatcher = TagDispatcher::new();
    dispatcher.register(
        FnVisitor::new(TagClass::SCENARIO, |map, scenarios| {
            for entry in scenarios {
                let scenario = map.entry_body::<Scenario>(entry)?;
                for record in scenario.structure_bsps(map)? {
                    let bsp = record.open(map)?;
                    for lightmap in bsp.lightmaps()? {
                        for material in lightmap.materials(&bsp)? {
                            triangles += material.triangles(&bsp)?.len();
                        }
                    }
                }
            }
            Ok(())
        })
        .depends_on(TagClass::SHADER_ENVIRONMENT),
    )?;
    dispatcher.register(
        FnVisitor::new(TagClass::SHADER_ENVIRONMENT, |map, shaders| {
            for entry in shaders {
                let shader = map.entry_body::<ShaderEnvironment>(entry)?;
                shader_maps += shader.maps().iter().filter(|reference| reference.is_set()).count();
            }
            Ok(())
        })
        .depends_on(TagClass::BITMAP),
    )?;
    dispatcher.register(FnVisitor::new(TagClass::BITMAP, |map, bitmaps| {
        for entry in bitmaps {
            if entry.is_external() {
                continue;
            }
            let bitmap = map.entry_body::<Bitmap>(entry)?;
            for data in bitmap.bitmaps(map)? {
                pixel_bytes += data.pixel_data_size() as usize;
            }
        }
        Ok(())
    }))?;

    dispatcher.run(&map)?;
    drop(dispatcher);

    println!();
    println!("Internal pixel data:   {pixel_bytes} bytes");
    println!("Environment maps used: {shader_maps}");
    println!("BSP triangles:         {triangles}");

    Ok(())
}
