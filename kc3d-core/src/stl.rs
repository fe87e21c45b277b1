/// STL file parser for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take, take_till},
    character::complete::{multispace0, multispace1},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::{Mesh, Triangle, Vertex};

/// Parse a binary STL body: 80-byte header, triangle count, then 50-byte
/// triangle records (normal, three vertices, attribute byte count).
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < 84 {
        return Err(Error::Stl("file too small to be a valid STL".into()));
    }

    // The body length is fully determined by the declared count; checking it
    // up front rejects truncated files before any triangle storage is sized.
    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = 84 + declared * 50;
    if data.len() < expected {
        return Err(Error::Stl(format!(
            "binary body truncated: {} bytes for {} declared triangles",
            data.len(),
            declared
        )));
    }

    match parse_binary_impl(data) {
        Ok((_, mesh)) => Ok(mesh),
        Err(nom::Err::Incomplete(_)) | Err(nom::Err::Error(_)) | Err(nom::Err::Failure(_)) => {
            Err(Error::Stl("truncated binary triangle records".into()))
        }
    }
}

fn parse_binary_impl(input: &[u8]) -> IResult<&[u8], Mesh> {
    let (input, _header) = take(80usize)(input)?;
    let (input, triangle_count) = le_u32(input)?;
    let (input, triangles) = count(parse_binary_triangle, triangle_count as usize)(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_binary_triangle(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, (nx, ny, nz)) = tuple((le_f32, le_f32, le_f32))(input)?;
    let (input, corners) = count(tuple((le_f32, le_f32, le_f32)), 3)(input)?;
    let (input, _attribute) = le_u16(input)?;

    let v = |&(x, y, z): &(f32, f32, f32)| Vertex::new(x, y, z, nx, ny, nz);
    Ok((
        input,
        Triangle::new(v(&corners[0]), v(&corners[1]), v(&corners[2])),
    ))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match parse_ascii_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(Error::Stl(format!("ascii grammar: {e:?}"))),
    }
}

fn parse_ascii_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = take_till(|c| c == '\n')(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal)?;
    let (input, v2) = parse_vertex(input, normal)?;
    let (input, v3) = parse_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(input: &str, normal: (f32, f32, f32)) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Vertex::new(x, y, z, normal.0, normal.1, normal.2)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Detect and parse an STL model (binary or ASCII).
///
/// ASCII detection keys off the leading `solid` token; some binary exporters
/// also write `solid` into the comment header, so a failed ASCII parse falls
/// through to the binary path.
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

/// Serialize a mesh back to binary STL bytes.
///
/// Used by the slot tooling and tests to author stand-in model files.
pub fn write_binary_stl(mesh: &Mesh) -> Vec<u8> {
    let mut out = vec![0u8; 80];
    out.extend_from_slice(&(mesh.triangles.len() as u32).to_le_bytes());
    for triangle in &mesh.triangles {
        let n = triangle.vertices[0].normal;
        for f in [n.x, n.y, n.z] {
            out.extend_from_slice(&f.to_le_bytes());
        }
        for vertex in &triangle.vertices {
            let p = vertex.position;
            for f in [p.x, p.y, p.z] {
                out.extend_from_slice(&f.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn parse_binary_header_only() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn binary_round_trip_preserves_triangles() {
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(2.0, 2.0, 2.0));
        let bytes = write_binary_stl(&mesh);
        let parsed = parse_stl(&bytes).unwrap();

        assert_eq!(parsed.triangles.len(), mesh.triangles.len());
        let b = parsed.bounds().unwrap();
        assert!((b.size() - Vector3::new(2.0, 2.0, 2.0)).norm() < 1e-6);
    }

    #[test]
    fn truncated_binary_is_an_error() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 50]); // one record, two missing

        assert!(matches!(parse_binary_stl(&data), Err(Error::Stl(_))));
    }

    #[test]
    fn parse_ascii_single_facet() {
        let text = "\
solid part
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid part
";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert!((mesh.triangles[0].vertices[0].normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }
}
