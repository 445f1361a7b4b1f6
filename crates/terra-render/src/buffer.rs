//! Vertex, index and instance buffers for scene geometry.

use bytemuck::{Pod, Zeroable};
use terra_scene::{MeshData, PointCloud};
use wgpu::util::DeviceExt;

/// An uploaded indexed mesh.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    pub fn new(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = VertexPositionNormalUv::interleave(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// An uploaded point cloud, drawn as one camera-facing quad per point.
pub struct StarBuffer {
    pub instance_buffer: wgpu::Buffer,
    pub count: u32,
}

impl StarBuffer {
    /// Vertices per sprite: two triangles.
    pub const QUAD_VERTICES: u32 = 6;

    pub fn new(device: &wgpu::Device, label: &str, cloud: &PointCloud) -> Self {
        let instances = StarInstance::from_cloud(cloud);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-instances")),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            instance_buffer,
            count: instances.len() as u32,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        render_pass.draw(0..Self::QUAD_VERTICES, 0..self.count);
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPositionNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexPositionNormalUv {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        use wgpu::{VertexAttribute, VertexFormat};

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPositionNormalUv>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: (std::mem::size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }

    /// Zip the mesh's attribute streams. Missing normals or UVs become zero.
    pub fn interleave(mesh: &MeshData) -> Vec<Self> {
        mesh.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Self {
                position,
                normal: mesh.normals.get(i).copied().unwrap_or_default(),
                uv: mesh.uvs.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }
}

/// Per-instance star data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct StarInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

impl StarInstance {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        use wgpu::{VertexAttribute, VertexFormat};

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StarInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: VertexFormat::Float32,
                },
            ],
        }
    }

    /// Points without a colour are white; without a size, size 1.
    pub fn from_cloud(cloud: &PointCloud) -> Vec<Self> {
        cloud
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Self {
                position,
                color: cloud.colors.get(i).copied().unwrap_or([1.0; 3]),
                size: cloud.sizes.get(i).copied().unwrap_or(1.0),
            })
            .collect()
    }
}
