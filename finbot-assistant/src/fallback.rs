//! Canned financial-education replies for messages that are neither a
//! transaction nor a data query.

use finbot_core::{UserFinancialContext, format_brl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Balance,
    Spending,
    Saving,
    Investing,
    Debt,
    Budgeting,
    Income,
    Categories,
    Goals,
}

/// Checked top to bottom; the first row with a keyword in the message wins.
const TOPICS: &[(&[&str], Topic)] = &[
    (&["saldo", "quanto tenho"], Topic::Balance),
    (&["gasto", "gastei", "despesa"], Topic::Spending),
    (&["economizar", "poupar"], Topic::Saving),
    (&["investir", "investimento"], Topic::Investing),
    (&["dívida", "dever"], Topic::Debt),
    (&["orçamento", "planejar"], Topic::Budgeting),
    (&["receita", "renda", "ganho"], Topic::Income),
    (&["categoria", "onde gasto"], Topic::Categories),
    (&["meta", "objetivo"], Topic::Goals),
];

const SPENDING: &str = "Seus gastos recentes mostram padrões interessantes. Para otimizar suas finanças, \
sugiro categorizar melhor seus gastos e definir metas mensais. Use o dashboard para visualizar onde está gastando mais.";

const SAVING: &str = "Dicas para economizar:\n\
• Defina uma meta de economia mensal\n\
• Categorize seus gastos essenciais vs supérfluos\n\
• Use a regra 50-30-20 (necessidades-desejos-poupança)\n\
• Revise gastos recorrentes mensalmente";

const INVESTING: &str = "Para começar a investir:\n\
• Primeiro, quite dívidas de juros altos\n\
• Monte uma reserva de emergência\n\
• Estude produtos de baixo risco (Tesouro Direto, CDB)\n\
• Diversifique gradualmente seus investimentos";

const DEBT: &str = "Para lidar com dívidas:\n\
• Liste todas as dívidas com seus juros\n\
• Priorize quitar as de juros maiores\n\
• Negocie parcelamentos se necessário\n\
• Evite contrair novas dívidas";

const BUDGETING: &str = "Planejamento financeiro:\n\
• Registre todas as receitas e despesas\n\
• Defina limites por categoria\n\
• Revise seu orçamento todo mês\n\
• Use o FinBot para acompanhar seu progresso";

const INCOME: &str = "Para aumentar sua receita:\n\
• Diversifique suas fontes de renda\n\
• Invista em capacitação profissional\n\
• Considere trabalhos extras ou freelances\n\
• Fique de olho em oportunidades de aumento salarial";

const CATEGORIES: &str = "Para analisar seus gastos por categoria:\n\
• Acesse o Dashboard para ver os gráficos\n\
• Identifique suas maiores categorias de gasto\n\
• Defina limites por categoria\n\
• Acompanhe as tendências mês a mês";

const GOALS: &str = "Definindo metas financeiras:\n\
• Estabeleça metas SMART (específicas, mensuráveis, atingíveis)\n\
• Comece com metas de curto prazo (30-90 dias)\n\
• Use o FinBot para acompanhar seu progresso\n\
• Celebre pequenas conquistas no caminho";

const OVERSPENDING: &str = "Atenção: seus gastos estão maiores que sua renda. Sugiro revisar despesas \
não essenciais e montar um plano de redução de custos. Posso ajudar a identificar onde cortar gastos.";

/// Capability menu shown when nothing else applies.
pub const MENU: &str = "Como seu assistente financeiro, estou aqui para ajudar! Posso te auxiliar com:\n\n\
• Controle de gastos e receitas\n\
• Análise de padrões financeiros\n\
• Dicas de economia e investimento\n\
• Planejamento orçamentário\n\
• Estratégias para quitar dívidas\n\n\
Sobre o que gostaria de conversar especificamente?";

impl Topic {
    fn reply(&self, context: Option<&UserFinancialContext>) -> String {
        match self {
            Topic::Balance => {
                let balance = context.map(|c| c.balance).unwrap_or(0.0);
                let remark = if balance > 0.0 {
                    "Você está com saldo positivo!"
                } else {
                    "Considere revisar seus gastos."
                };
                format!("Seu saldo atual é de {}. {remark}", format_brl(balance))
            }
            Topic::Spending => SPENDING.to_string(),
            Topic::Saving => SAVING.to_string(),
            Topic::Investing => INVESTING.to_string(),
            Topic::Debt => DEBT.to_string(),
            Topic::Budgeting => BUDGETING.to_string(),
            Topic::Income => INCOME.to_string(),
            Topic::Categories => CATEGORIES.to_string(),
            Topic::Goals => GOALS.to_string(),
        }
    }
}

/// First topic whose keywords appear in the message.
pub fn detect_topic(message: &str) -> Option<Topic> {
    let msg = message.to_lowercase();
    TOPICS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| msg.contains(k)))
        .map(|(_, topic)| *topic)
}

/// Deterministic reply for a conversational message.
pub fn fallback(message: &str, context: Option<&UserFinancialContext>) -> String {
    if let Some(topic) = detect_topic(message) {
        return topic.reply(context);
    }

    if let Some(ctx) = context {
        if ctx.total_expenses > ctx.total_income {
            return OVERSPENDING.to_string();
        }
        if ctx.balance > 1000.0 {
            return format!(
                "Parabéns! Você tem um saldo positivo de {}. Considere:\n\
• Separar parte para emergências\n\
• Investir em produtos conservadores\n\
• Definir metas de poupança mensais",
                format_brl(ctx.balance)
            );
        }
    }

    MENU.to_string()
}
