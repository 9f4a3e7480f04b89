//! Basic usage example for nebula-rules

use nebula_rules::prelude::*;

struct Signup {
    email: String,
    age: u8,
    tags: Vec<String>,
}

impl Reflect for Signup {
    fn type_of() -> Type {
        Type::structure(
            "Signup",
            vec![
                Field::new("email", String::type_of()).rule("@email"),
                Field::new("age", u8::type_of()).rule("@uint8[18,]"),
                Field::new("tags", Vec::<String>::type_of()).rule("@slice<@alpha>[,3]?"),
            ],
        )
    }

    fn to_value(&self) -> Value {
        Value::structure([
            ("email", self.email.to_value()),
            ("age", self.age.to_value()),
            ("tags", self.tags.to_value()),
        ])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let factory = Factory::builtin();

    // A single rule against a scalar type
    let name = factory.compile("@string[1,10]", &Type::string(), &[])?;
    println!("compiled: {name}");
    for input in ["hello", "much too long for this"] {
        match name.validate(&Value::from(input)) {
            Ok(()) => println!("✓ {input:?} is valid"),
            Err(e) => println!("✗ {input:?} is invalid: {e}"),
        }
    }

    // A whole struct, rules read from field tags
    let signup = Signup {
        email: "not-an-email".into(),
        age: 16,
        tags: vec!["rust".into(), "42".into()],
    };
    if let Err(e) = factory.validate(&signup) {
        println!("\n{e}");
    }

    println!("\ncached validators: {}", factory.cached_len());
    Ok(())
}
