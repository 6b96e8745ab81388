// Vertex layout - how a flat block of vertex bytes maps to attribute slots
//
// Elements are pushed in attribute-slot order (0, 1, 2, ...). The stride is
// the running byte size of one interleaved vertex, so it must match the real
// vertex struct or attribute fetches read garbage. Nothing can check that here.

/// Primitive component types a vertex attribute may use.
///
/// This set is closed: the driver layer only knows how to describe these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    F32,
    U32,
    U8,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        match self {
            ComponentType::F32 => 4,
            ComponentType::U32 => 4,
            ComponentType::U8 => 1,
        }
    }

    pub const fn gl_enum(self) -> u32 {
        match self {
            ComponentType::F32 => glow::FLOAT,
            ComponentType::U32 => glow::UNSIGNED_INT,
            ComponentType::U8 => glow::UNSIGNED_BYTE,
        }
    }

    /// Byte components (colors) are normalized to 0..1 by default.
    pub const fn normalized_by_default(self) -> bool {
        matches!(self, ComponentType::U8)
    }

    pub const fn from_gl_enum(gl_type: u32) -> Option<Self> {
        match gl_type {
            glow::FLOAT => Some(ComponentType::F32),
            glow::UNSIGNED_INT => Some(ComponentType::U32),
            glow::UNSIGNED_BYTE => Some(ComponentType::U8),
            _ => None,
        }
    }
}

/// Byte size of a raw GL component type enum.
///
/// # Panics
/// Panics for any enum outside `FLOAT`, `UNSIGNED_INT` and `UNSIGNED_BYTE`.
pub fn size_of_gl_type(gl_type: u32) -> u32 {
    match ComponentType::from_gl_enum(gl_type) {
        Some(ty) => ty.size(),
        None => panic!("unsupported vertex component type {gl_type:#06x}"),
    }
}

/// One attribute in a vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutElement {
    pub ty: ComponentType,
    pub count: u32,
    pub normalized: bool,
}

impl LayoutElement {
    /// Bytes this element contributes to the stride.
    pub const fn size(&self) -> u32 {
        self.count * self.ty.size()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    elements: Vec<LayoutElement>,
    stride: u32,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute of `count` components using the type's default
    /// normalization.
    pub fn push(&mut self, ty: ComponentType, count: u32) -> &mut Self {
        self.push_normalized(ty, count, ty.normalized_by_default())
    }

    pub fn push_normalized(&mut self, ty: ComponentType, count: u32, normalized: bool) -> &mut Self {
        let element = LayoutElement { ty, count, normalized };
        self.stride += element.size();
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    /// Byte distance between the starts of two consecutive vertices.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Walk the elements as `(slot, byte_offset, element)`.
    pub fn attributes(&self) -> impl Iterator<Item = (u32, u32, &LayoutElement)> + '_ {
        self.elements
            .iter()
            .scan(0u32, |offset, element| {
                let start = *offset;
                *offset += element.size();
                Some((start, element))
            })
            .enumerate()
            .map(|(slot, (offset, element))| (slot as u32, offset, element))
    }
}
