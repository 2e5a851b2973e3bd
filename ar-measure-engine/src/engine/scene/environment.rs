/// Lighting and a flat reference grid on the simulated surface
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use constants::interaction::SIMULATED_SURFACE_HEIGHT;
use constants::render_settings::{
    AMBIENT_BRIGHTNESS, AMBIENT_GROUND_COLOUR, AMBIENT_SKY_COLOUR, GRID_HALF_EXTENT, GRID_SPACING,
};

#[derive(Component)]
pub struct GroundGrid;

/// Hemisphere-style ambient: halfway between the sky and ground tints.
pub fn spawn_ambient_light(commands: &mut Commands) {
    commands.insert_resource(AmbientLight {
        color: AMBIENT_SKY_COLOUR.mix(&AMBIENT_GROUND_COLOUR, 0.5),
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

pub fn spawn_environment(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let grid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.25),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(flat_grid_mesh(
            GRID_HALF_EXTENT,
            GRID_SPACING,
            SIMULATED_SURFACE_HEIGHT,
        ))),
        MeshMaterial3d(grid_material),
        GroundGrid,
    ));
}

/// Square line grid centred on the origin at the given height.
pub fn flat_grid_mesh(half_extent: f32, spacing: f32, height: f32) -> Mesh {
    let line_count = (2.0 * half_extent / spacing).round().max(1.0) as u32;
    let step = 2.0 * half_extent / line_count as f32;

    let mut vertices = Vec::new();
    for i in 0..=line_count {
        let offset = -half_extent + i as f32 * step;
        // Line along Z at fixed X, then along X at fixed Z
        vertices.push([offset, height, -half_extent]);
        vertices.push([offset, height, half_extent]);
        vertices.push([-half_extent, height, offset]);
        vertices.push([half_extent, height, offset]);
    }
    let indices = (0..vertices.len() as u32).collect();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(Indices::U32(indices));

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    #[test]
    fn grid_lies_on_surface_height() {
        let mesh = flat_grid_mesh(1.0, 0.5, 0.25);

        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("grid mesh has no positions");
        };

        // 5 lines each way, two endpoints per line
        assert_eq!(positions.len(), 20);
        assert!(positions.iter().all(|p| p[1] == 0.25));
        assert_eq!(mesh.indices().map(|i| i.len()), Some(20));
    }
}
