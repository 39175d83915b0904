//! GLSL declaration scanner.
//!
//! The bundled devices do not execute GLSL. They only need to know which
//! attributes, uniforms and varyings a shader declares so that location
//! queries behave like a real driver, and they reject the mistakes a real
//! compiler or linker would reject. Errors are returned as driver-style logs
//! (`ERROR: 0:<line>: <message>`).

use std::collections::BTreeMap;

use super::device::ShaderStage;

const KNOWN_TYPES: &[&str] = &[
    "float", "int", "bool", "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4", "bvec2", "bvec3",
    "bvec4", "mat2", "mat3", "mat4", "sampler2D", "samplerCube",
];

const PRECISIONS: &[&str] = &["lowp", "mediump", "highp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Attribute,
    Uniform,
    Varying,
}

impl Qualifier {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "attribute" => Some(Qualifier::Attribute),
            "uniform" => Some(Qualifier::Uniform),
            "varying" => Some(Qualifier::Varying),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub qualifier: Qualifier,
    pub ty: String,
    pub name: String,
    pub line: usize,
}

/// Global declarations of one compiled stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    pub stage: ShaderStage,
    pub declarations: Vec<Declaration>,
}

impl ShaderInterface {
    pub fn declared(&self, qualifier: Qualifier) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.qualifier == qualifier)
    }

    fn find(&self, qualifier: Qualifier, name: &str) -> Option<&Declaration> {
        self.declared(qualifier).find(|d| d.name == name)
    }
}

/// Active attributes and uniforms of a linked program, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInterface {
    pub attributes: Vec<(String, String)>,
    pub uniforms: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

/// Replaces `//` and `/* */` comments with spaces, keeping line breaks.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let mut start = None;
        for (i, c) in line.char_indices() {
            let word = c.is_ascii_alphanumeric() || c == '_' || c == '.';
            match (word, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    tokens.push(Token {
                        text: &line[s..i],
                        line: index + 1,
                    });
                    start = None;
                }
                _ => {}
            }
            if !word && !c.is_whitespace() {
                tokens.push(Token {
                    text: &line[i..i + c.len_utf8()],
                    line: index + 1,
                });
            }
        }
        if let Some(s) = start {
            tokens.push(Token {
                text: &line[s..],
                line: index + 1,
            });
        }
    }
    tokens
}

fn error(line: usize, message: impl AsRef<str>) -> String {
    format!("ERROR: 0:{line}: {}", message.as_ref())
}

/// Scans one shader stage.
///
/// # Errors
///
/// Returns the compiler log for unbalanced braces, a missing `void main()`,
/// `attribute` declarations in a fragment shader, and unknown types.
pub fn compile(stage: ShaderStage, source: &str) -> Result<ShaderInterface, String> {
    let stripped = strip_comments(source);
    let tokens = tokenize(&stripped);

    let mut declarations = Vec::new();
    let mut statement: Vec<Token<'_>> = Vec::new();
    let mut depth = 0usize;
    let mut has_main = false;
    let mut last_line = 1;

    for token in tokens {
        last_line = token.line;
        match token.text {
            "{" => {
                if depth == 0 {
                    let words: Vec<&str> = statement.iter().map(|t| t.text).collect();
                    if words.starts_with(&["void", "main", "("]) {
                        has_main = true;
                    }
                    statement.clear();
                }
                depth += 1;
            }
            "}" => {
                if depth == 0 {
                    return Err(error(token.line, "syntax error: unexpected '}'"));
                }
                depth -= 1;
            }
            ";" if depth == 0 => {
                parse_statement(stage, &statement, &mut declarations)?;
                statement.clear();
            }
            _ if depth == 0 => statement.push(token),
            _ => {}
        }
    }

    if depth != 0 {
        return Err(error(last_line, "syntax error: unexpected end of file, missing '}'"));
    }
    if !has_main {
        return Err(error(0, "missing function: main"));
    }

    Ok(ShaderInterface {
        stage,
        declarations,
    })
}

fn parse_statement(
    stage: ShaderStage,
    statement: &[Token<'_>],
    out: &mut Vec<Declaration>,
) -> Result<(), String> {
    let Some((first, rest)) = statement.split_first() else {
        return Ok(());
    };
    let Some(qualifier) = Qualifier::parse(first.text) else {
        return Ok(());
    };
    if qualifier == Qualifier::Attribute && stage == ShaderStage::Fragment {
        return Err(error(
            first.line,
            "'attribute' : supported in vertex shaders only",
        ));
    }

    let mut rest = rest
        .iter()
        .skip_while(|t| PRECISIONS.contains(&t.text))
        .peekable();
    let Some(ty) = rest.next() else {
        return Err(error(first.line, "syntax error: expected a type"));
    };
    if !KNOWN_TYPES.contains(&ty.text) {
        return Err(error(ty.line, format!("'{}' : unknown type", ty.text)));
    }

    // name [ '[' size ']' ] { ',' name [ '[' size ']' ] }
    let mut expect_name = true;
    let mut in_brackets = false;
    for token in rest {
        match token.text {
            "[" => in_brackets = true,
            "]" => in_brackets = false,
            _ if in_brackets => {}
            "," => expect_name = true,
            name if expect_name => {
                if !is_identifier(name) {
                    return Err(error(token.line, format!("'{name}' : syntax error")));
                }
                out.push(Declaration {
                    qualifier,
                    ty: ty.text.to_string(),
                    name: name.to_string(),
                    line: token.line,
                });
                expect_name = false;
            }
            other => return Err(error(token.line, format!("'{other}' : syntax error"))),
        }
    }
    if expect_name {
        return Err(error(ty.line, "syntax error: expected an identifier"));
    }
    Ok(())
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Checks that two stages fit together and merges their interfaces.
///
/// # Errors
///
/// Returns the linker log when the fragment stage reads a varying the vertex
/// stage does not write (or writes with another type), or when both stages
/// declare a uniform with different types.
pub fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<ProgramInterface, String> {
    for varying in fragment.declared(Qualifier::Varying) {
        match vertex.find(Qualifier::Varying, &varying.name) {
            None => {
                return Err(format!(
                    "ERROR: Varying '{}' not written by vertex shader",
                    varying.name
                ))
            }
            Some(v) if v.ty != varying.ty => {
                return Err(format!(
                    "ERROR: Varying '{}' type mismatch ({} vs {})",
                    varying.name, v.ty, varying.ty
                ))
            }
            Some(_) => {}
        }
    }

    let mut uniform_types: BTreeMap<&str, &str> = BTreeMap::new();
    let mut uniforms = Vec::new();
    for decl in vertex
        .declared(Qualifier::Uniform)
        .chain(fragment.declared(Qualifier::Uniform))
    {
        match uniform_types.get(decl.name.as_str()) {
            Some(ty) if *ty != decl.ty => {
                return Err(format!(
                    "ERROR: Uniform '{}' declared with conflicting types ({} vs {})",
                    decl.name, ty, decl.ty
                ))
            }
            Some(_) => {}
            None => {
                uniform_types.insert(&decl.name, &decl.ty);
                uniforms.push((decl.name.clone(), decl.ty.clone()));
            }
        }
    }

    let attributes = vertex
        .declared(Qualifier::Attribute)
        .map(|d| (d.name.clone(), d.ty.clone()))
        .collect();

    Ok(ProgramInterface {
        attributes,
        uniforms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
        attribute vec3 a_position; // object space
        uniform mat4 u_modelTransform, u_worldViewProjection;
        /* multi-line
           uniform float u_ignored; */
        varying highp vec3 v_position;
        void main() {
            v_position = a_position;
            gl_Position = u_worldViewProjection * u_modelTransform * vec4(a_position, 1.0);
        }
    "#;

    const FS: &str = r#"
        precision mediump float;
        uniform vec4 u_color;
        varying vec3 v_position;
        void main(void) {
            gl_FragColor = u_color;
        }
    "#;

    #[test]
    fn extracts_declarations() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let names: Vec<&str> = vs.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["a_position", "u_modelTransform", "u_worldViewProjection", "v_position"]
        );
    }

    #[test]
    fn link_merges_uniforms() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let program = link(&vs, &fs).unwrap();
        assert_eq!(
            program.attributes,
            [(String::from("a_position"), String::from("vec3"))]
        );
        assert_eq!(program.uniforms.len(), 3);
    }

    #[test]
    fn compile_errors() {
        let missing_main = compile(ShaderStage::Vertex, "uniform float x;").unwrap_err();
        assert!(missing_main.contains("main"));

        let unbalanced = compile(ShaderStage::Vertex, "void main() {").unwrap_err();
        assert!(unbalanced.contains("'}'"));

        let attr = compile(ShaderStage::Fragment, "attribute vec3 a;\nvoid main() {}").unwrap_err();
        assert!(attr.starts_with("ERROR: 0:1:"));

        let ty = compile(ShaderStage::Vertex, "\nuniform vec5 u;\nvoid main() {}").unwrap_err();
        assert_eq!(ty, "ERROR: 0:2: 'vec5' : unknown type");
    }

    #[test]
    fn link_errors() {
        let vs = compile(ShaderStage::Vertex, "uniform float u;\nvoid main() {}").unwrap();
        let fs = compile(ShaderStage::Fragment, "varying vec2 v_uv;\nvoid main() {}").unwrap();
        assert!(link(&vs, &fs).unwrap_err().contains("v_uv"));

        let fs = compile(ShaderStage::Fragment, "uniform int u;\nvoid main() {}").unwrap();
        assert!(link(&vs, &fs).unwrap_err().contains("conflicting"));
    }
}
