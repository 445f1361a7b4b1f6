//! WGSL sources. Bind groups are shared between pipelines:
//! group 0 frame (camera, lights), group 1 model, group 2 material.

/// Lit, textured planet surface.
pub const PLANET_SHADER_SOURCE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    viewport: vec4<f32>,
};

struct Light {
    header: vec4<u32>,
    color: vec4<f32>,
    position: vec4<f32>,
    ground: vec4<f32>,
};

struct Lights {
    lights: array<Light, 8>,
    count: vec4<u32>,
};

struct Model {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
};

struct Material {
    color: vec4<f32>,
    emissive: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> lights: Lights;
@group(1) @binding(0) var<uniform> model: Model;
@group(2) @binding(0) var<uniform> material: Material;
@group(2) @binding(1) var t_color: texture_2d<f32>;
@group(2) @binding(2) var t_specular: texture_2d<f32>;
@group(2) @binding(3) var t_normal: texture_2d<f32>;
@group(2) @binding(4) var s_surface: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = model.model * vec4<f32>(in.position, 1.0);
    out.clip_position = camera.view_proj * world;
    out.world_position = world.xyz;
    out.normal = (model.normal * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

// Tangent frame from screen-space derivatives; no tangent attribute needed.
fn perturb_normal(pos: vec3<f32>, n: vec3<f32>, uv: vec2<f32>, map_n: vec3<f32>) -> vec3<f32> {
    let q0 = dpdx(pos);
    let q1 = dpdy(pos);
    let st0 = dpdx(uv);
    let st1 = dpdy(uv);
    let q1perp = cross(q1, n);
    let q0perp = cross(n, q0);
    let t = q1perp * st0.x + q0perp * st1.x;
    let b = q1perp * st0.y + q0perp * st1.y;
    let det = max(dot(t, t), dot(b, b));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return normalize(t * (map_n.x * scale) + b * (map_n.y * scale) + n * map_n.z);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base_sample = textureSample(t_color, s_surface, in.uv);
    let spec_sample = textureSample(t_specular, s_surface, in.uv);
    let normal_sample = textureSample(t_normal, s_surface, in.uv);

    let base = material.color.rgb * base_sample.rgb;
    // Green drives roughness, blue metalness.
    let roughness = clamp(material.params.x * spec_sample.g, 0.04, 1.0);
    let metalness = clamp(material.params.y * spec_sample.b, 0.0, 1.0);

    var map_n = normal_sample.xyz * 2.0 - 1.0;
    map_n = vec3<f32>(map_n.xy * material.params.z, map_n.z);
    let n = perturb_normal(in.world_position, normalize(in.normal), in.uv, map_n);
    let v = normalize(camera.position.xyz - in.world_position);

    let diffuse_color = base * (1.0 - metalness);
    let f0 = mix(vec3<f32>(0.04), base, metalness);
    let shininess = max(2.0 / (roughness * roughness * roughness * roughness) - 2.0, 1.0);

    var indirect = vec3<f32>(0.0);
    var direct = vec3<f32>(0.0);
    let count = min(lights.count.x, 8u);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = lights.lights[i];
        switch light.header.x {
            case 0u: {
                indirect += light.color.rgb;
            }
            case 2u: {
                let w = 0.5 * dot(n, vec3<f32>(0.0, 1.0, 0.0)) + 0.5;
                indirect += mix(light.ground.rgb, light.color.rgb, w);
            }
            default: {
                var l = light.position.xyz;
                if light.header.x == 3u {
                    l = light.position.xyz - in.world_position;
                }
                l = normalize(l);
                let ndl = max(dot(n, l), 0.0);
                let h = normalize(l + v);
                let spec = pow(max(dot(n, h), 0.0), shininess) * (shininess + 2.0) / 8.0;
                direct += light.color.rgb * ndl * (diffuse_color + f0 * spec);
            }
        }
    }

    let color = indirect * diffuse_color + direct + material.emissive.rgb;
    return vec4<f32>(color, 1.0);
}
"#;

/// Round star sprites with per-instance colour and size.
pub const STAR_SHADER_SOURCE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    viewport: vec4<f32>,
};

struct Model {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
};

struct Points {
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var<uniform> model: Model;
@group(2) @binding(0) var<uniform> points: Points;

struct InstanceInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) size: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) corner: vec2<f32>,
};

fn quad_corner(index: u32) -> vec2<f32> {
    switch index {
        case 0u: { return vec2<f32>(-1.0, -1.0); }
        case 1u: { return vec2<f32>(1.0, -1.0); }
        case 2u: { return vec2<f32>(1.0, 1.0); }
        case 3u: { return vec2<f32>(-1.0, -1.0); }
        case 4u: { return vec2<f32>(1.0, 1.0); }
        default: { return vec2<f32>(-1.0, 1.0); }
    }
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, in: InstanceInput) -> VertexOutput {
    var out: VertexOutput;
    let corner = quad_corner(vertex_index);
    let clip = camera.view_proj * model.model * vec4<f32>(in.position, 1.0);

    // Pixel diameter: world size scaled by half the viewport height over
    // distance when attenuated, never under one pixel.
    var pixels = in.size * points.params.z;
    if points.params.x > 0.5 {
        pixels = pixels * camera.viewport.y * 0.5 / max(clip.w, 1e-4);
    }
    pixels = max(pixels, 1.0);

    let offset = corner * pixels / camera.viewport.xy * clip.w;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.zw);
    out.color = select(vec3<f32>(1.0), in.color, points.params.y > 0.5);
    out.corner = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let r = length(in.corner);
    if r > 1.0 {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.6, 1.0, r);
    return vec4<f32>(in.color, alpha);
}
"#;
