//! Program fixtures
//!
//! Small object-oriented programs expressed directly as flow templates.

use super::builders::Program;
use typeflow_engine::features::type_flow::domain::{
    FieldId, FilterSpec, InvokeHandle, MethodFlags, MethodId, TemplateNodeId, TypeDef, TypeId,
    TypeUniverse,
};
use typeflow_engine::features::type_flow::{EntryPoint, MethodTemplate, ParameterRef};

// ============================================================================
// Filters
// ============================================================================

/// `T` with subtype `S`, plus an unrelated `Other`
pub struct FilterFixture {
    pub program: Program,
    pub main: MethodId,
    pub t: TypeId,
    pub s: TypeId,
    pub other: TypeId,
    pub filtered: TemplateNodeId,
}

/// `main` allocates `{T, S, Other}` and applies one type test
pub fn fixture_filter(spec_for: impl FnOnce(TypeId) -> FilterSpec) -> FilterFixture {
    let mut u = TypeUniverse::new();
    let t = u.add_type(TypeDef::new("T")).unwrap();
    let s = u.add_type(TypeDef::new("S").extends(t)).unwrap();
    let other = u.add_type(TypeDef::new("Other")).unwrap();
    let main = u.add_method(None, "main", MethodFlags::static_method()).unwrap();

    let mut b = MethodTemplate::builder(main);
    let mixed = b.local(None);
    for (ty, site) in [(t, 1), (s, 2), (other, 3)] {
        let obj = b.alloc(ty, site);
        b.flow(obj, mixed);
    }
    let filtered = b.filter(mixed, spec_for(t));

    FilterFixture {
        program: Program::new(u)
            .with_template(b.build())
            .with_entry(EntryPoint::new(main)),
        main,
        t,
        s,
        other,
        filtered,
    }
}

// ============================================================================
// Virtual dispatch
// ============================================================================

/// `Shape.area` overridden by `Circle` and `Square`
pub struct ShapesFixture {
    pub program: Program,
    pub main: MethodId,
    pub circle: TypeId,
    pub square: TypeId,
    pub small: TypeId,
    pub large: TypeId,
    pub shape_area: MethodId,
    pub circle_area: MethodId,
    pub square_area: MethodId,
    pub unused: MethodId,
    pub call: InvokeHandle,
}

/// ```text
/// main() { s = cond ? new Circle() : new Square(); return s.area(); }
/// Circle.area() { return new Small(); }
/// Square.area() { return new Large(); }
/// ```
pub fn fixture_shapes() -> ShapesFixture {
    let mut u = TypeUniverse::new();
    let shape = u.add_type(TypeDef::new("Shape").abstract_type()).unwrap();
    let circle = u.add_type(TypeDef::new("Circle").extends(shape)).unwrap();
    let square = u.add_type(TypeDef::new("Square").extends(shape)).unwrap();
    let number = u.add_type(TypeDef::new("Number").abstract_type()).unwrap();
    let small = u.add_type(TypeDef::new("Small").extends(number)).unwrap();
    let large = u.add_type(TypeDef::new("Large").extends(number)).unwrap();

    let main = u.add_method(None, "main", MethodFlags::static_method()).unwrap();
    let shape_area = u.add_method(Some(shape), "area", MethodFlags::abstract_method()).unwrap();
    let circle_area = u.add_method(Some(circle), "area", MethodFlags::instance()).unwrap();
    let square_area = u.add_method(Some(square), "area", MethodFlags::instance()).unwrap();
    let unused = u.add_method(Some(square), "perimeter", MethodFlags::instance()).unwrap();

    let mut b = MethodTemplate::builder(main);
    let s = b.local(Some(shape));
    let c = b.alloc(circle, 10);
    let q = b.alloc(square, 11);
    b.flow(c, s).flow(q, s);
    let call = b.invoke_virtual(100, shape_area, s, &[]);
    b.returns(call.result);
    let main_template = b.build();

    let area = |method: MethodId, receiver_type: TypeId, result_type: TypeId, site| {
        let mut b = MethodTemplate::builder(method);
        b.receiver(Some(receiver_type));
        let r = b.alloc(result_type, site);
        b.returns(r);
        b.build()
    };

    let mut p = MethodTemplate::builder(unused);
    p.receiver(Some(square));

    ShapesFixture {
        program: Program::new(u)
            .with_template(main_template)
            .with_template(area(circle_area, circle, small, 20))
            .with_template(area(square_area, square, large, 21))
            .with_template(p.build())
            .with_entry(EntryPoint::new(main)),
        main,
        circle,
        square,
        small,
        large,
        shape_area,
        circle_area,
        square_area,
        unused,
        call,
    }
}

// ============================================================================
// Fields
// ============================================================================

pub struct FieldFixture {
    pub program: Program,
    pub main: MethodId,
    pub reader: MethodId,
    pub other_reader: MethodId,
    pub field: FieldId,
    pub x: TypeId,
    pub y: TypeId,
    pub load: TemplateNodeId,
    pub other_load: TemplateNodeId,
    pub read_call: InvokeHandle,
}

/// ```text
/// static Object Holder.value;
/// storeX() { Holder.value = new X(); }
/// storeY() { Holder.value = new Y(); }
/// read()   { return Holder.value; }
/// peek()   { return Holder.value; }
/// main()   { storeX(); storeY(); peek(); return read(); }
/// ```
pub fn fixture_fields() -> FieldFixture {
    let mut u = TypeUniverse::new();
    let object = u.add_type(TypeDef::new("Object")).unwrap();
    let holder = u.add_type(TypeDef::new("Holder").extends(object)).unwrap();
    let x = u.add_type(TypeDef::new("X").extends(object)).unwrap();
    let y = u.add_type(TypeDef::new("Y").extends(object)).unwrap();
    let field = u.add_field(Some(holder), "value", object, true).unwrap();

    let main = u.add_method(None, "main", MethodFlags::static_method()).unwrap();
    let store_x = u.add_method(None, "storeX", MethodFlags::static_method()).unwrap();
    let store_y = u.add_method(None, "storeY", MethodFlags::static_method()).unwrap();
    let reader = u.add_method(None, "read", MethodFlags::static_method()).unwrap();
    let other_reader = u.add_method(None, "peek", MethodFlags::static_method()).unwrap();

    let store = |method: MethodId, ty: TypeId, site| {
        let mut b = MethodTemplate::builder(method);
        let v = b.alloc(ty, site);
        b.field_store(field, v, Some(object));
        b.build()
    };
    let load = |method: MethodId| {
        let mut b = MethodTemplate::builder(method);
        let l = b.field_load(field, Some(object));
        b.returns(l);
        (b.build(), l)
    };
    let (read_template, load_node) = load(reader);
    let (peek_template, other_load) = load(other_reader);

    let mut b = MethodTemplate::builder(main);
    b.invoke_static(1, store_x, &[]);
    b.invoke_static(2, store_y, &[]);
    b.invoke_static(3, other_reader, &[]);
    let read_call = b.invoke_static(4, reader, &[]);
    b.returns(read_call.result);

    FieldFixture {
        program: Program::new(u)
            .with_template(b.build())
            .with_template(store(store_x, x, 30))
            .with_template(store(store_y, y, 31))
            .with_template(read_template)
            .with_template(peek_template)
            .with_entry(EntryPoint::new(main)),
        main,
        reader,
        other_reader,
        field,
        x,
        y,
        load: load_node,
        other_load,
        read_call,
    }
}

// ============================================================================
// Unknown values
// ============================================================================

pub struct UnknownFixture {
    pub program: Program,
    pub main: MethodId,
    pub filtered: TemplateNodeId,
    pub after: TemplateNodeId,
}

/// `main(args)` with unknown `args`, tested twice against `T`
pub fn fixture_unknown_filter() -> UnknownFixture {
    let mut u = TypeUniverse::new();
    let t = u.add_type(TypeDef::new("T")).unwrap();
    let main = u.add_method(None, "main", MethodFlags::static_method()).unwrap();

    let mut b = MethodTemplate::builder(main);
    let args = b.parameter(0, None);
    let filtered = b.filter(args, FilterSpec::instance_of(t));
    let also_unknown = b.constant(typeflow_engine::TypeState::unknown());
    b.flow(also_unknown, filtered);
    let after = b.local(None);
    b.flow(filtered, after);

    UnknownFixture {
        program: Program::new(u)
            .with_template(b.build())
            .with_entry(EntryPoint::new(main).with_unknown_arguments(1)),
        main,
        filtered,
        after,
    }
}

// ============================================================================
// Context sensitivity
// ============================================================================

pub struct IdentityFixture {
    pub program: Program,
    pub main: MethodId,
    pub identity: MethodId,
    pub a: TypeId,
    pub b: TypeId,
    pub first: InvokeHandle,
    pub second: InvokeHandle,
}

/// ```text
/// static Object id(Object p) { return p; }
/// main() { r1 = id(new A()); r2 = id(new B()); }
/// ```
pub fn fixture_identity(returns_parameter: bool) -> IdentityFixture {
    let mut u = TypeUniverse::new();
    let object = u.add_type(TypeDef::new("Object")).unwrap();
    let a = u.add_type(TypeDef::new("A").extends(object)).unwrap();
    let bt = u.add_type(TypeDef::new("B").extends(object)).unwrap();
    let main = u.add_method(None, "main", MethodFlags::static_method()).unwrap();
    let identity = u.add_method(None, "id", MethodFlags::static_method()).unwrap();

    let mut t = MethodTemplate::builder(identity);
    let p = t.parameter(0, Some(object));
    t.returns(p);
    if returns_parameter {
        t.returns_parameter(ParameterRef::Argument(0));
    }

    let mut m = MethodTemplate::builder(main);
    let oa = m.alloc(a, 1);
    let ob = m.alloc(bt, 2);
    let first = m.invoke_static(10, identity, &[oa]);
    let second = m.invoke_static(11, identity, &[ob]);

    IdentityFixture {
        program: Program::new(u)
            .with_template(m.build())
            .with_template(t.build())
            .with_entry(EntryPoint::new(main)),
        main,
        identity,
        a,
        b: bt,
        first,
        second,
    }
}

pub struct FluentFixture {
    pub program: Program,
    pub main: MethodId,
    pub first: InvokeHandle,
    pub second: InvokeHandle,
}

/// ```text
/// class Builder { Builder self() { return this; } }
/// main() { r1 = new Builder()@1.self(); r2 = new Builder()@2.self(); }
/// ```
pub fn fixture_fluent() -> FluentFixture {
    let mut u = TypeUniverse::new();
    let builder = u.add_type(TypeDef::new("Builder")).unwrap();
    let main = u.add_method(None, "main", MethodFlags::static_method()).unwrap();
    let self_method = u.add_method(Some(builder), "self", MethodFlags::instance()).unwrap();

    let mut t = MethodTemplate::builder(self_method);
    let this = t.receiver(Some(builder));
    t.returns(this);
    t.returns_parameter(ParameterRef::Receiver);

    let mut m = MethodTemplate::builder(main);
    let b1 = m.alloc(builder, 1);
    let b2 = m.alloc(builder, 2);
    let first = m.invoke_virtual(10, self_method, b1, &[]);
    let second = m.invoke_virtual(11, self_method, b2, &[]);

    FluentFixture {
        program: Program::new(u)
            .with_template(m.build())
            .with_template(t.build())
            .with_entry(EntryPoint::new(main)),
        main,
        first,
        second,
    }
}
