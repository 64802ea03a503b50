/// Buffers - vertex/index buffers and the streaming pool for client data
///
/// With VBO support every buffer owns a native buffer object. Without it the
/// data lives in CPU storage and draws go through client-side arrays. Client
/// vertex and index data drawn on a VBO context is copied into a pooled
/// power-of-two buffer first.

use slotmap::SlotMap;
use portgfx::portgfx::graphics::{IndexBufferId, VertexBufferId};
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_debug, engine_err};
use crate::gl_api::*;
use crate::gl_debug::clear_errors;

/// Number of stream buckets; the largest holds 2^23 bytes
pub(crate) const STREAM_BUCKETS: usize = 24;
/// Smallest bucket is 2^5 bytes
const MIN_BUCKET_SHIFT: usize = 5;

// ===== GL BUFFER =====

/// One vertex or index buffer
#[derive(Debug)]
pub(crate) struct GlBuffer {
    /// Native buffer name, 0 when data lives in `fallback`
    pub native: GLuint,
    pub target: GLenum,
    /// CPU copy used without VBO support
    pub fallback: Vec<u8>,
    /// Byte size
    pub size: usize,
    pub usage: GLenum,
    /// Vertex stride or index size in bytes
    pub element_size: usize,
}

impl GlBuffer {
    /// Allocate `size` bytes, optionally filled from `data`
    fn create(
        gl: &mut dyn GlApi,
        target: GLenum,
        size: usize,
        element_size: usize,
        data: Option<&[u8]>,
        usage: GLenum,
        use_vbo: bool,
    ) -> Result<Self> {
        if size == 0 {
            engine_bail!("portgfx::gl::Buffer", AllocationFailed => "cannot create an empty buffer");
        }
        let initial = match data {
            Some(bytes) if bytes.len() < size => {
                engine_bail!(
                    "portgfx::gl::Buffer",
                    "initial data holds {} bytes, buffer needs {}",
                    bytes.len(),
                    size
                );
            }
            Some(bytes) => Some(&bytes[..size]),
            None => None,
        };

        if !use_vbo {
            let fallback = initial.map_or_else(|| vec![0; size], <[u8]>::to_vec);
            return Ok(Self { native: 0, target, fallback, size, usage, element_size });
        }

        clear_errors(gl);
        let native = gl.gen_buffer();
        gl.bind_buffer(target, native);
        gl.buffer_data(target, size, initial, usage);
        let error = gl.get_error();
        gl.bind_buffer(target, 0);
        if native == 0 || error != GL_NO_ERROR {
            if native != 0 {
                gl.delete_buffer(native);
            }
            engine_bail!(
                "portgfx::gl::Buffer",
                AllocationFailed => "buffer of {} bytes failed ({})",
                size,
                gl_error_name(error)
            );
        }
        Ok(Self { native, target, fallback: Vec::new(), size, usage, element_size })
    }

    /// Write `bytes` at byte `offset`, orphaning the old storage first when `reset`
    ///
    /// Leaves the buffer bound to its target.
    fn write(&mut self, gl: &mut dyn GlApi, offset: usize, bytes: &[u8], reset: bool) -> Result<()> {
        let end = offset + bytes.len();
        if end > self.size {
            engine_bail!(
                "portgfx::gl::Buffer",
                "write of {} bytes at {} overflows buffer of {}",
                bytes.len(),
                offset,
                self.size
            );
        }
        if self.native == 0 {
            self.fallback[offset..end].copy_from_slice(bytes);
            return Ok(());
        }
        gl.bind_buffer(self.target, self.native);
        if reset {
            gl.buffer_data(self.target, self.size, None, self.usage);
        }
        gl.buffer_sub_data(self.target, offset, bytes);
        Ok(())
    }

    fn delete(self, gl: &mut dyn GlApi) {
        if self.native != 0 {
            gl.delete_buffer(self.native);
        }
    }
}

fn usage_for(is_static: bool) -> GLenum {
    if is_static {
        GL_STATIC_DRAW
    } else {
        GL_DYNAMIC_DRAW
    }
}

// ===== BUFFER MANAGER =====

/// Vertex and index buffers created by the caller
pub(crate) struct BufferManager {
    vertex_buffers: SlotMap<VertexBufferId, GlBuffer>,
    index_buffers: SlotMap<IndexBufferId, GlBuffer>,
    use_vbo: bool,
}

impl BufferManager {
    pub fn new(use_vbo: bool) -> Self {
        Self {
            vertex_buffers: SlotMap::with_key(),
            index_buffers: SlotMap::with_key(),
            use_vbo,
        }
    }

    pub fn uses_vbo(&self) -> bool {
        self.use_vbo
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Option<&GlBuffer> {
        self.vertex_buffers.get(id)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Option<&GlBuffer> {
        self.index_buffers.get(id)
    }

    pub fn create_vertex_buffer(
        &mut self,
        gl: &mut dyn GlApi,
        stride: usize,
        data: Option<&[u8]>,
        vertex_count: usize,
        is_static: bool,
    ) -> Result<VertexBufferId> {
        let buffer = GlBuffer::create(
            gl,
            GL_ARRAY_BUFFER,
            stride * vertex_count,
            stride,
            data,
            usage_for(is_static),
            self.use_vbo,
        )?;
        Ok(self.vertex_buffers.insert(buffer))
    }

    /// Write `count` vertices from `data` at vertex index `start`
    pub fn vertex_buffer_set_data(
        &mut self,
        gl: &mut dyn GlApi,
        id: VertexBufferId,
        data: &[u8],
        start: usize,
        count: usize,
        reset: bool,
    ) -> Result<()> {
        let buffer = self
            .vertex_buffers
            .get_mut(id)
            .ok_or_else(|| engine_err!("portgfx::gl::Buffer", InvalidHandle => "unknown vertex buffer {:?}", id))?;
        let len = count * buffer.element_size;
        let Some(bytes) = data.get(..len) else {
            engine_bail!("portgfx::gl::Buffer", "{} vertices need {} bytes, got {}", count, len, data.len());
        };
        buffer.write(gl, start * buffer.element_size, bytes, reset)
    }

    pub fn delete_vertex_buffer(&mut self, gl: &mut dyn GlApi, id: VertexBufferId) -> Result<()> {
        let buffer = self
            .vertex_buffers
            .remove(id)
            .ok_or_else(|| engine_err!("portgfx::gl::Buffer", InvalidHandle => "unknown vertex buffer {:?}", id))?;
        buffer.delete(gl);
        Ok(())
    }

    pub fn create_index_buffer(
        &mut self,
        gl: &mut dyn GlApi,
        data: Option<&[u16]>,
        index_count: usize,
        is_static: bool,
    ) -> Result<IndexBufferId> {
        let buffer = GlBuffer::create(
            gl,
            GL_ELEMENT_ARRAY_BUFFER,
            index_count * 2,
            2,
            data.map(bytemuck::cast_slice),
            usage_for(is_static),
            self.use_vbo,
        )?;
        Ok(self.index_buffers.insert(buffer))
    }

    /// Write `count` indices from `data` at index `start`
    pub fn index_buffer_set_data(
        &mut self,
        gl: &mut dyn GlApi,
        id: IndexBufferId,
        data: &[u16],
        start: usize,
        count: usize,
        reset: bool,
    ) -> Result<()> {
        let buffer = self
            .index_buffers
            .get_mut(id)
            .ok_or_else(|| engine_err!("portgfx::gl::Buffer", InvalidHandle => "unknown index buffer {:?}", id))?;
        let Some(indices) = data.get(..count) else {
            engine_bail!("portgfx::gl::Buffer", "{} indices requested, got {}", count, data.len());
        };
        buffer.write(gl, start * 2, bytemuck::cast_slice(indices), reset)
    }

    pub fn delete_index_buffer(&mut self, gl: &mut dyn GlApi, id: IndexBufferId) -> Result<()> {
        let buffer = self
            .index_buffers
            .remove(id)
            .ok_or_else(|| engine_err!("portgfx::gl::Buffer", InvalidHandle => "unknown index buffer {:?}", id))?;
        buffer.delete(gl);
        Ok(())
    }

    /// Delete every buffer
    pub fn cleanup(&mut self, gl: &mut dyn GlApi) {
        for (_, buffer) in self.vertex_buffers.drain() {
            buffer.delete(gl);
        }
        for (_, buffer) in self.index_buffers.drain() {
            buffer.delete(gl);
        }
    }
}

// ===== STREAM POOL =====

/// Bucket index and byte size for `size` bytes, `None` past the largest bucket
pub(crate) fn stream_bucket(size: usize) -> Option<(usize, usize)> {
    let mut shift = MIN_BUCKET_SHIFT;
    let mut bucket = 1usize << shift;
    while bucket < size && shift < STREAM_BUCKETS {
        bucket <<= 1;
        shift += 1;
    }
    (shift < STREAM_BUCKETS).then_some((shift, bucket))
}

/// Lazily created stream buffers, one per power-of-two size
pub(crate) struct StreamPool {
    vertex: [Option<GlBuffer>; STREAM_BUCKETS],
    index: [Option<GlBuffer>; STREAM_BUCKETS],
}

impl StreamPool {
    pub fn new() -> Self {
        Self {
            vertex: std::array::from_fn(|_| None),
            index: std::array::from_fn(|_| None),
        }
    }

    /// Number of native stream buffers allocated so far
    pub fn allocated(&self) -> usize {
        self.vertex.iter().chain(self.index.iter()).filter(|b| b.is_some()).count()
    }

    /// Copy `bytes` to byte `offset` of a pooled array buffer, which stays bound
    pub fn stream_vertices(&mut self, gl: &mut dyn GlApi, bytes: &[u8], offset: usize) -> Result<GLuint> {
        Self::stream(gl, &mut self.vertex, GL_ARRAY_BUFFER, bytes, offset)
    }

    /// Copy `indices` to the start of a pooled element buffer, which stays bound
    pub fn stream_indices(&mut self, gl: &mut dyn GlApi, indices: &[u16]) -> Result<GLuint> {
        Self::stream(gl, &mut self.index, GL_ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices), 0)
    }

    fn stream(
        gl: &mut dyn GlApi,
        buckets: &mut [Option<GlBuffer>; STREAM_BUCKETS],
        target: GLenum,
        bytes: &[u8],
        offset: usize,
    ) -> Result<GLuint> {
        let needed = offset + bytes.len();
        let Some((index, size)) = stream_bucket(needed) else {
            engine_bail!("portgfx::gl::Buffer", AllocationFailed => "{} bytes exceed the largest stream buffer", needed);
        };
        let mut buffer = match buckets[index].take() {
            Some(buffer) => buffer,
            None => {
                let created = GlBuffer::create(gl, target, size, 1, None, GL_STREAM_DRAW, true)?;
                engine_debug!("portgfx::gl::Buffer", "stream buffer of {} bytes created", size);
                created
            }
        };
        let written = buffer.write(gl, offset, bytes, true);
        let native = buffer.native;
        buckets[index] = Some(buffer);
        written.map(|()| native)
    }

    pub fn cleanup(&mut self, gl: &mut dyn GlApi) {
        for slot in self.vertex.iter_mut().chain(self.index.iter_mut()) {
            if let Some(buffer) = slot.take() {
                buffer.delete(gl);
            }
        }
    }
}

#[cfg(test)]
#[path = "gl_buffer_tests.rs"]
mod tests;
