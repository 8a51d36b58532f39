//! Sample data for `--offline` runs.

use torahav_core::{gateway::Gateway, model::Category};
use torahav_gateway::MemoryGateway;

const DEMO_EMAIL: &str = "demo@torahav.local";
const DEMO_PASSWORD: &str = "torahav-demo";

/// An in-memory gateway with a few sources and insights, signed in as the
/// demo user.
pub async fn gateway() -> anyhow::Result<MemoryGateway> {
  let gateway = MemoryGateway::new().with_auto_confirm();
  let demo = gateway.seed_user(DEMO_EMAIL, DEMO_PASSWORD, "demo");
  let author = gateway.seed_user("miriam@torahav.local", "not-used-here", "miriam");

  let bereshit = gateway.seed_source(
    "בראשית א",
    "בְּרֵאשִׁית בָּרָא אֱלֹהִים אֵת הַשָּׁמַיִם וְאֵת הָאָרֶץ.\nוְהָאָרֶץ הָיְתָה תֹהוּ וָבֹהוּ וְחֹשֶׁךְ עַל פְּנֵי תְהוֹם.",
    Category::Tanakh,
  );
  let avot = gateway.seed_source(
    "אבות א, יד",
    "הוּא הָיָה אוֹמֵר, אִם אֵין אֲנִי לִי, מִי לִי.\nוּכְשֶׁאֲנִי לְעַצְמִי, מָה אֲנִי.\nוְאִם לֹא עַכְשָׁיו, אֵימָתָי.",
    Category::Mishnah,
  );
  gateway.seed_source(
    "ברכות ב.",
    "מֵאֵימָתַי קוֹרִין אֶת שְׁמַע בְּעַרְבִית.",
    Category::Talmud,
  );

  let first = gateway.seed_insight(
    author.id,
    bereshit.id,
    "הבריאה מתחילה בהבדלה: אור מחושך, מים ממים. הסדר קודם לשפע.",
  );
  gateway.seed_likes(first, 3);
  let second = gateway.seed_insight(
    author.id,
    avot.id,
    "שלוש שאלות, שלושה זמנים: האני, היחד, והרגע הזה.",
  );
  gateway.seed_like(demo.id, second);

  gateway
    .sign_in_with_password(DEMO_EMAIL.to_owned(), DEMO_PASSWORD.to_owned())
    .await?;
  Ok(gateway)
}
