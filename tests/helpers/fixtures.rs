//! Semantic tree builders for host and registry tests.
//!
//! Every construct sits on whole lines; line `n` starts at offset `n * 100`.

use std::sync::Arc;

use archgen::ide::DesignModelHost;
use archgen::syntax::{
    Arg, ClassDefinition, Expr, FunctionBody, FunctionDefinition, FunctionKind, Ident,
    ListenerDecl, ModuleMember, ModuleVariable, ObjectField, Project, ProjectMember, RawRange,
    RecordField, ServiceDecl, SourceFile, Stmt, SymbolTable, TypeDefinition, TypeDesc,
    TypeDescriptor, TypeKind, TypeSymbol,
};

pub const PROJECT: &str = "file:///workspace/app";
pub const MEMBER: &str = "app";

pub fn at(line: u32) -> RawRange {
    RawRange::new(line, 0, line, 40, line * 100, line * 100 + 40)
}

pub fn lines(start: u32, end: u32) -> RawRange {
    RawRange::new(start, 0, end, 1, start * 100, end * 100 + 1)
}

pub fn ident(text: &str, line: u32) -> Option<Ident> {
    Some(Ident::new(text, at(line)))
}

pub fn name(text: &str, line: u32) -> Expr {
    Expr::Name {
        name: Arc::from(text),
        range: at(line),
    }
}

pub fn literal(value: &str, line: u32) -> Expr {
    Expr::Literal {
        value: Arc::from(value),
        range: at(line),
    }
}

pub fn new_of(module: &str, ty: &str, args: Vec<Arg>, line: u32) -> Expr {
    Expr::New {
        type_desc: Some(TypeDesc::qualified(module, ty)),
        args,
        range: at(line),
    }
}

/// `listener http:Listener {var} = new ({port});`
pub fn listener(var: &str, port: &str, line: u32) -> ModuleMember {
    ModuleMember::Listener(ListenerDecl {
        name: ident(var, line),
        type_desc: Some(TypeDesc::qualified("http", "Listener")),
        init: new_of("http", "Listener", vec![Arg::positional(literal(port, line))], line),
        range: at(line),
    })
}

/// `final http:Client {var} = check new ("...");`
pub fn client_var(var: &str, line: u32) -> ModuleMember {
    let init = new_of("http", "Client", vec![Arg::positional(literal("\"http://svc\"", line))], line);
    ModuleMember::Variable(ModuleVariable {
        name: ident(var, line),
        type_desc: Some(TypeDesc::qualified("http", "Client")),
        init: Some(Expr::Check {
            expr: Box::new(init),
            range: at(line),
        }),
        is_final: true,
        range: at(line),
    })
}

/// `{client}->get("/")` as a statement.
pub fn remote_call(client: &str, line: u32) -> Stmt {
    Stmt::Expr {
        expr: Expr::RemoteCall {
            client: Box::new(name(client, line)),
            method: Arc::from("get"),
            args: vec![],
            range: at(line),
        },
    }
}

/// `resource function {accessor} {path}() { ... }` spanning `start..=end`.
pub fn resource(accessor: &str, path: &str, body: Vec<Stmt>, start: u32, end: u32) -> FunctionDefinition {
    FunctionDefinition {
        kind: FunctionKind::Resource,
        name: None,
        accessor: ident(accessor, start),
        resource_path: vec![Arc::from(path)],
        annotations: vec![],
        params: vec![],
        return_type: None,
        body: FunctionBody::Block { statements: body },
        range: lines(start, end),
    }
}

/// Module-level `function {fn_name}() { ... }`.
pub fn function(fn_name: &str, body: Vec<Stmt>, start: u32, end: u32) -> ModuleMember {
    ModuleMember::Function(FunctionDefinition {
        kind: FunctionKind::Function,
        name: ident(fn_name, start),
        accessor: None,
        resource_path: vec![],
        annotations: vec![],
        params: vec![],
        return_type: None,
        body: FunctionBody::Block { statements: body },
        range: lines(start, end),
    })
}

/// `service {path} on {listener} { ... }` spanning `start..=end`.
pub fn service(
    path: &str,
    listener: &str,
    functions: Vec<FunctionDefinition>,
    start: u32,
    end: u32,
) -> ModuleMember {
    ModuleMember::Service(ServiceDecl {
        annotations: vec![],
        type_desc: None,
        base_path: Some(Arc::from(path)),
        attach_points: vec![name(listener, start)],
        fields: vec![],
        functions,
        open_brace: RawRange::new(start, 30, start, 31, start * 100 + 30, start * 100 + 31),
        range: lines(start, end),
    })
}

/// A service with no listener to attach to.
pub fn detached_service(path: &str, start: u32, end: u32) -> ModuleMember {
    let ModuleMember::Service(mut decl) = service(path, "unused", vec![], start, end) else {
        unreachable!()
    };
    decl.attach_points.clear();
    ModuleMember::Service(decl)
}

/// `type {type_name} record {| ... |};` with one field per following line.
pub fn record(type_name: &str, fields: &[(&str, &str)], start: u32) -> ModuleMember {
    let end = start + fields.len() as u32 + 1;
    let fields = fields
        .iter()
        .enumerate()
        .map(|(i, (field, ty))| {
            let line = start + 1 + i as u32;
            RecordField {
                name: ident(field, line),
                type_desc: Some(TypeDesc::local(*ty)),
                optional: false,
                readonly: false,
                range: RawRange::new(line, 4, line, 20, line * 100 + 4, line * 100 + 20),
            }
        })
        .collect();
    ModuleMember::Type(TypeDefinition {
        name: ident(type_name, start),
        descriptor: TypeDescriptor::Record {
            fields,
            open_brace: RawRange::new(start, 20, start, 22, start * 100 + 20, start * 100 + 22),
        },
        range: lines(start, end),
    })
}

/// `class {class_name} { }` with optional object fields.
pub fn class(class_name: &str, fields: Vec<ObjectField>, start: u32, end: u32) -> ModuleMember {
    ModuleMember::Class(ClassDefinition {
        name: ident(class_name, start),
        is_client: false,
        fields,
        methods: vec![],
        open_brace: RawRange::new(start, 15, start, 16, start * 100 + 15, start * 100 + 16),
        range: lines(start, end),
    })
}

pub fn http_symbols() -> SymbolTable {
    SymbolTable::new()
        .with_type(
            TypeSymbol::new("http:Listener", TypeKind::Listener)
                .with_module("ballerina/http")
                .with_init_params(["port", "config"]),
        )
        .with_type(TypeSymbol::new("http:Client", TypeKind::Client).with_module("ballerina/http"))
}

pub fn member_with(files: Vec<SourceFile>) -> ProjectMember {
    files
        .into_iter()
        .fold(ProjectMember::new(MEMBER).with_symbols(http_symbols()), |m, f| {
            m.with_file(f)
        })
}

pub fn project_with(files: Vec<SourceFile>) -> Project {
    Project::new(PROJECT).with_member(member_with(files))
}

/// The L1/S1 project: one listener on 8080, one service with one resource.
pub fn greeting_file() -> SourceFile {
    SourceFile::new(
        "main.bal",
        vec![
            listener("l1", "8080", 1),
            service("/s1", "l1", vec![resource("get", "greeting", vec![], 4, 6)], 3, 7),
        ],
    )
}

/// `greeting_file` with a second resource method.
pub fn greeting_file_with_post() -> SourceFile {
    SourceFile::new(
        "main.bal",
        vec![
            listener("l1", "8080", 1),
            service(
                "/s1",
                "l1",
                vec![
                    resource("get", "greeting", vec![], 4, 6),
                    resource("post", "greeting", vec![], 7, 9),
                ],
                3,
                10,
            ),
        ],
    )
}

/// A host whose loader knows exactly one project.
pub fn host_for(project: Project) -> DesignModelHost {
    DesignModelHost::new(move |uri: &str| (uri == project.uri.as_ref()).then(|| project.clone()))
}
