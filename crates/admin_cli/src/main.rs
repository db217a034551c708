use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, ErrorKind};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "depot_admin")]
#[command(about = "Admin utilities for the depot stock ledger (schema and reference data)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./depot.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    Warehouse(Warehouse),
    Supplier(Supplier),
    Employee(Employee),
    Customer(Customer),
}

#[derive(Args, Debug)]
struct Warehouse {
    #[command(subcommand)]
    command: WarehouseCommand,
}

#[derive(Subcommand, Debug)]
enum WarehouseCommand {
    Create(WarehouseCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct WarehouseCreateArgs {
    #[arg(long)]
    location: String,
    #[arg(long)]
    capacity: i32,
}

#[derive(Args, Debug)]
struct Supplier {
    #[command(subcommand)]
    command: SupplierCommand,
}

#[derive(Subcommand, Debug)]
enum SupplierCommand {
    Create(SupplierCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct SupplierCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    contact_no: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    address: String,
}

#[derive(Args, Debug)]
struct Employee {
    #[command(subcommand)]
    command: EmployeeCommand,
}

#[derive(Subcommand, Debug)]
enum EmployeeCommand {
    Create(EmployeeCreateArgs),
}

#[derive(Args, Debug)]
struct EmployeeCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// Free-form job title, `staff` when omitted.
    #[arg(long)]
    role: Option<String>,
}

#[derive(Args, Debug)]
struct Customer {
    #[command(subcommand)]
    command: CustomerCommand,
}

#[derive(Subcommand, Debug)]
enum CustomerCommand {
    Create(CustomerCreateArgs),
}

#[derive(Args, Debug)]
struct CustomerCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    contact_no: Option<String>,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Exit code for an engine failure: 2 for bad input, 1 otherwise.
fn exit_code(err: &EngineError) -> i32 {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Conflict => 2,
        _ => 1,
    }
}

async fn execute(engine: &Engine, command: Command) -> Result<(), EngineError> {
    match command {
        Command::Migrate => println!("migrations applied"),
        Command::Warehouse(Warehouse {
            command: WarehouseCommand::Create(args),
        }) => {
            let warehouse = engine.new_warehouse(&args.location, args.capacity).await?;
            println!("created warehouse: {} ({})", warehouse.location, warehouse.id);
        }
        Command::Warehouse(Warehouse {
            command: WarehouseCommand::List,
        }) => {
            for warehouse in engine.warehouses().await? {
                println!(
                    "{}\t{}\tcapacity {}",
                    warehouse.id, warehouse.location, warehouse.capacity
                );
            }
        }
        Command::Supplier(Supplier {
            command: SupplierCommand::Create(args),
        }) => {
            let supplier = engine
                .new_supplier(&args.name, &args.contact_no, &args.email, &args.address)
                .await?;
            println!("created supplier: {} ({})", supplier.name, supplier.id);
        }
        Command::Supplier(Supplier {
            command: SupplierCommand::List,
        }) => {
            for supplier in engine.suppliers().await? {
                println!("{}\t{}\t{}", supplier.id, supplier.name, supplier.email);
            }
        }
        Command::Employee(Employee {
            command: EmployeeCommand::Create(args),
        }) => {
            let employee = engine
                .new_employee(&args.name, &args.email, args.role.as_deref())
                .await?;
            println!("created employee: {} ({})", employee.name, employee.id);
        }
        Command::Customer(Customer {
            command: CustomerCommand::Create(args),
        }) => {
            let customer = engine
                .new_customer(&args.name, &args.email, args.contact_no.as_deref())
                .await?;
            println!("created customer: {} ({})", customer.name, customer.id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db.clone()).build().await?;

    if let Err(err) = execute(&engine, cli.command).await {
        eprintln!("{err}");
        std::process::exit(exit_code(&err));
    }

    db.close().await?;
    Ok(())
}
