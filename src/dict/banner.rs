//! Fixed header/footer text shared by every dictionary this crate writes.

pub const BANNER: &str = r#"/*--------------------------------*- C++ -*----------------------------------*\
| =========                 |                                                 |
| \\      /  F ield         | OpenFOAM: The Open Source CFD Toolbox           |
|  \\    /   O peration     | Version:  2.3.x                                 |
|   \\  /    A nd           | Web:      www.OpenFOAM.org                      |
|    \\/     M anipulation  |                                                 |
\*---------------------------------------------------------------------------*/
"#;

pub const SEPARATOR: &str =
    "// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //\n";

pub const FOOTER: &str =
    "// ************************************************************************* //\n";

/// Banner plus a `FoamFile` header block and the separator line.
pub fn foam_file_header(format: &str, location: Option<&str>, object: &str) -> String {
    let mut out = String::from(BANNER);
    out.push_str("FoamFile\n{\n");
    out.push_str("    version     2.0;\n");
    out.push_str(&format!("    format      {};\n", format));
    out.push_str("    class       dictionary;\n");
    if let Some(loc) = location {
        out.push_str(&format!("    location    \"{}\";\n", loc));
    }
    out.push_str(&format!("    object      {};\n", object));
    out.push_str("}\n");
    out.push_str(SEPARATOR);
    out
}
